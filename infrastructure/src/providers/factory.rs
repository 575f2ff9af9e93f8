//! Port factory
//!
//! Picks the adapter for a `(capability, provider)` pair once, at wiring
//! time. Missing keys, endpoints or task endpoints fail here with
//! [`InferenceError::Configuration`] instead of on the first request.

use super::chat::{ChatTextPort, ChatVisionPort};
use super::dashscope::{
    DashScopeImageEditPort, DashScopeImagePort, DashScopeSpeechPort, dashscope_edit_model,
};
use super::http::ProviderHttp;
use super::settings::{CapabilitySettings, ProviderSettings};
use super::zhipu::{ZhipuImagePort, ZhipuSpeechPort};
use crate::config::FileProvidersConfig;
use mmagent_application::{
    ImageEditPort, ImagePort, InferenceError, InferencePort, SpeechPort, TaskPoller, TextPort,
    VisionPort,
};
use mmagent_domain::{Capability, Protocol, Provider};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Fully checked settings for one port.
struct ResolvedCapability {
    endpoint: String,
    task_endpoint: Option<String>,
    model: String,
}

pub struct PortFactory {
    client: Client,
    settings: HashMap<Provider, ProviderSettings>,
}

impl PortFactory {
    /// Resolve every provider from config plus the process environment.
    pub fn new(client: Client, providers: &FileProvidersConfig) -> Self {
        let settings = [Provider::DashScope, Provider::Zhipu, Provider::OpenAiCompatible]
            .into_iter()
            .map(|p| ProviderSettings::resolve(p, providers.get(p)));
        Self::from_settings(client, settings)
    }

    pub fn from_settings(
        client: Client,
        settings: impl IntoIterator<Item = ProviderSettings>,
    ) -> Self {
        Self {
            client,
            settings: settings.into_iter().map(|s| (s.provider, s)).collect(),
        }
    }

    pub fn settings(&self, provider: Provider) -> Option<&ProviderSettings> {
        self.settings.get(&provider)
    }

    /// Build the port for `capability` backed by `provider`.
    pub fn create(
        &self,
        capability: Capability,
        provider: Provider,
    ) -> Result<InferencePort, InferenceError> {
        let port = match capability {
            Capability::Text => InferencePort::Text(self.text(provider)?),
            Capability::Vision => InferencePort::Vision(self.vision(provider)?),
            Capability::TextToSpeech => InferencePort::Speech(self.speech(provider)?),
            Capability::TextToImage => InferencePort::Image(self.image(provider)?),
        };
        debug!(%capability, %provider, "Created inference port");
        Ok(port)
    }

    pub fn text(&self, provider: Provider) -> Result<Arc<TextPort>, InferenceError> {
        let (http, cap) = self.prepare(Capability::Text, provider)?;
        Ok(Arc::new(ChatTextPort::new(provider, http, &cap.endpoint, cap.model)))
    }

    pub fn vision(&self, provider: Provider) -> Result<Arc<VisionPort>, InferenceError> {
        let (http, cap) = self.prepare(Capability::Vision, provider)?;
        Ok(Arc::new(ChatVisionPort::new(provider, http, &cap.endpoint, cap.model)))
    }

    pub fn speech(&self, provider: Provider) -> Result<Arc<SpeechPort>, InferenceError> {
        let (http, cap) = self.prepare(Capability::TextToSpeech, provider)?;
        match provider {
            Provider::DashScope => Ok(Arc::new(DashScopeSpeechPort::new(
                http,
                cap.endpoint,
                cap.model,
            ))),
            Provider::Zhipu => Ok(Arc::new(ZhipuSpeechPort::new(http, cap.endpoint, cap.model))),
            Provider::OpenAiCompatible => Err(unsupported(Capability::TextToSpeech, provider)),
        }
    }

    pub fn image(&self, provider: Provider) -> Result<Arc<ImagePort>, InferenceError> {
        let (http, cap) = self.prepare(Capability::TextToImage, provider)?;
        let task_endpoint = cap.task_endpoint.unwrap_or_default();
        match provider {
            Provider::DashScope => Ok(Arc::new(DashScopeImagePort::new(
                http,
                cap.endpoint,
                task_endpoint,
                cap.model,
            ))),
            Provider::Zhipu => Ok(Arc::new(ZhipuImagePort::new(
                http,
                cap.endpoint,
                task_endpoint,
                cap.model,
            ))),
            Provider::OpenAiCompatible => Err(unsupported(Capability::TextToImage, provider)),
        }
    }

    /// Image editing rides on the text-to-image settings (key, endpoints and
    /// the paired edit model). `poller` drives the vendor's task loop.
    pub fn image_edit(
        &self,
        provider: Provider,
        poller: TaskPoller,
    ) -> Result<Arc<ImageEditPort>, InferenceError> {
        if provider != Provider::DashScope {
            return Err(InferenceError::Configuration(format!(
                "image editing is not supported by provider {}",
                provider
            )));
        }
        let (http, cap) = self.prepare(Capability::TextToImage, provider)?;
        debug!(%provider, model = %dashscope_edit_model(&cap.model), "Created image edit port");
        Ok(Arc::new(DashScopeImageEditPort::new(
            http,
            cap.endpoint,
            cap.task_endpoint.unwrap_or_default(),
            dashscope_edit_model(&cap.model),
            poller,
        )))
    }

    fn prepare(
        &self,
        capability: Capability,
        provider: Provider,
    ) -> Result<(ProviderHttp, ResolvedCapability), InferenceError> {
        if !provider.supports(capability) {
            return Err(unsupported(capability, provider));
        }
        let settings = self.settings.get(&provider).ok_or_else(|| {
            InferenceError::Configuration(format!("provider {} is not configured", provider))
        })?;
        let api_key = settings.api_key.clone().ok_or_else(|| {
            InferenceError::Configuration(format!(
                "missing API key for {} (set {} or providers.{}.api_key)",
                provider, settings.api_key_env, provider
            ))
        })?;
        let resolved = check_capability(capability, provider, settings.capability(capability))?;
        Ok((ProviderHttp::new(self.client.clone(), api_key), resolved))
    }
}

fn check_capability(
    capability: Capability,
    provider: Provider,
    cap: CapabilitySettings,
) -> Result<ResolvedCapability, InferenceError> {
    let missing = |field: &str| {
        InferenceError::Configuration(format!(
            "{} for {} has no {} configured",
            capability, provider, field
        ))
    };
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let endpoint = non_empty(cap.endpoint).ok_or_else(|| missing("endpoint"))?;
    let model = non_empty(cap.model).ok_or_else(|| missing("model"))?;
    let task_endpoint = non_empty(cap.task_endpoint);
    if capability.protocol() == Protocol::Async && task_endpoint.is_none() {
        return Err(missing("task_endpoint"));
    }
    Ok(ResolvedCapability {
        endpoint,
        task_endpoint,
        model,
    })
}

fn unsupported(capability: Capability, provider: Provider) -> InferenceError {
    InferenceError::Configuration(format!(
        "{} is not supported by provider {}",
        capability, provider
    ))
}
