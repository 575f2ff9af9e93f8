//! Resolved provider settings
//!
//! Built-in vendor defaults overlaid with `[providers.<name>]` config and the
//! API key from the environment.

use super::http::join_url;
use crate::config::FileProviderConfig;
use mmagent_domain::{Capability, Provider};

pub const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const ZHIPU_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const DASHSCOPE_T2I_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";
const DASHSCOPE_TASK_ENDPOINT: &str = "https://dashscope.aliyuncs.com/api/v1/tasks";
const DASHSCOPE_TTS_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/audio/tts/synthesis";

/// Endpoint, status endpoint and model for one capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySettings {
    pub endpoint: Option<String>,
    pub task_endpoint: Option<String>,
    pub model: Option<String>,
}

impl CapabilitySettings {
    fn new(endpoint: Option<String>, task_endpoint: Option<String>, model: &str) -> Self {
        Self {
            endpoint,
            task_endpoint,
            model: Some(model.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub provider: Provider,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub text: CapabilitySettings,
    pub vision: CapabilitySettings,
    pub text_to_image: CapabilitySettings,
    pub text_to_speech: CapabilitySettings,
}

impl ProviderSettings {
    /// Vendor defaults with no API key.
    pub fn builtin(provider: Provider) -> Self {
        match provider {
            Provider::DashScope => Self {
                provider,
                api_key_env: "DASHSCOPE_API_KEY".to_string(),
                api_key: None,
                base_url: DASHSCOPE_BASE_URL.to_string(),
                text: CapabilitySettings::new(None, None, "qwen-plus-2025-12-01"),
                vision: CapabilitySettings::new(None, None, "qwen3-vl-plus"),
                text_to_image: CapabilitySettings::new(
                    Some(DASHSCOPE_T2I_ENDPOINT.to_string()),
                    Some(DASHSCOPE_TASK_ENDPOINT.to_string()),
                    "wan2.6-t2i",
                ),
                text_to_speech: CapabilitySettings::new(
                    Some(DASHSCOPE_TTS_ENDPOINT.to_string()),
                    None,
                    "qwen-tts",
                ),
            },
            Provider::Zhipu => Self {
                provider,
                api_key_env: "ZHIPU_API_KEY".to_string(),
                api_key: None,
                base_url: ZHIPU_BASE_URL.to_string(),
                text: CapabilitySettings::new(None, None, "glm-4.5"),
                vision: CapabilitySettings::new(None, None, "glm-4v"),
                text_to_image: CapabilitySettings::new(
                    Some(join_url(ZHIPU_BASE_URL, "async/images/generations")),
                    Some(join_url(ZHIPU_BASE_URL, "async/tasks")),
                    "glm-image",
                ),
                text_to_speech: CapabilitySettings::new(
                    Some(join_url(ZHIPU_BASE_URL, "audio/speech")),
                    None,
                    "glm-tts",
                ),
            },
            Provider::OpenAiCompatible => Self {
                provider,
                api_key_env: "OPENAI_API_KEY".to_string(),
                api_key: None,
                base_url: OPENAI_BASE_URL.to_string(),
                text: CapabilitySettings::new(None, None, "gpt-4o-mini"),
                vision: CapabilitySettings::new(None, None, "gpt-4o"),
                text_to_image: CapabilitySettings::default(),
                text_to_speech: CapabilitySettings::default(),
            },
        }
    }

    /// Overlay `file` on the defaults, reading the key from the process environment.
    pub fn resolve(provider: Provider, file: &FileProviderConfig) -> Self {
        Self::resolve_with(provider, file, |name| std::env::var(name).ok())
    }

    /// Overlay `file` on the defaults with an explicit environment lookup.
    pub fn resolve_with(
        provider: Provider,
        file: &FileProviderConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut settings = Self::builtin(provider);
        if let Some(name) = &file.api_key_env {
            settings.api_key_env = name.clone();
        }
        if let Some(url) = &file.base_url {
            settings.base_url = url.clone();
        }
        settings.api_key = file
            .api_key
            .clone()
            .or_else(|| env(&settings.api_key_env))
            .filter(|key| !key.trim().is_empty());

        for capability in Capability::ALL {
            let overrides = file.capability(capability);
            let target = settings.capability_mut(capability);
            if overrides.endpoint.is_some() {
                target.endpoint = overrides.endpoint.clone();
            }
            if overrides.task_endpoint.is_some() {
                target.task_endpoint = overrides.task_endpoint.clone();
            }
            if overrides.model.is_some() {
                target.model = overrides.model.clone();
            }
        }
        settings
    }

    /// Settings for `capability`. Chat capabilities default their endpoint to the base URL.
    pub fn capability(&self, capability: Capability) -> CapabilitySettings {
        let mut resolved = match capability {
            Capability::Text => self.text.clone(),
            Capability::Vision => self.vision.clone(),
            Capability::TextToImage => self.text_to_image.clone(),
            Capability::TextToSpeech => self.text_to_speech.clone(),
        };
        if matches!(capability, Capability::Text | Capability::Vision) && resolved.endpoint.is_none()
        {
            resolved.endpoint = Some(self.base_url.clone());
        }
        resolved
    }

    fn capability_mut(&mut self, capability: Capability) -> &mut CapabilitySettings {
        match capability {
            Capability::Text => &mut self.text,
            Capability::Vision => &mut self.vision,
            Capability::TextToImage => &mut self.text_to_image,
            Capability::TextToSpeech => &mut self.text_to_speech,
        }
    }
}
