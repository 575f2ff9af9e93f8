//! Provider configuration from TOML (`[providers]` section)
//!
//! Every field is optional. Unset values fall back to the vendor's built-in
//! defaults when the port factory resolves settings.

use mmagent_domain::{Capability, Provider};
use serde::{Deserialize, Serialize};

/// Endpoint and model override for one capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCapabilityConfig {
    /// Full URL (image / speech) or base URL (text / vision)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Status URL prefix for submit-then-poll capabilities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One vendor's credentials and overrides.
///
/// ```toml
/// [providers.dashscope]
/// api_key_env = "DASHSCOPE_API_KEY"
///
/// [providers.dashscope.vision]
/// model = "qwen3-vl-plus"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Direct API key (prefer `api_key_env`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for the chat-completions API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub text: FileCapabilityConfig,
    pub vision: FileCapabilityConfig,
    pub text_to_image: FileCapabilityConfig,
    pub text_to_speech: FileCapabilityConfig,
}

impl FileProviderConfig {
    pub fn capability(&self, capability: Capability) -> &FileCapabilityConfig {
        match capability {
            Capability::Text => &self.text,
            Capability::Vision => &self.vision,
            Capability::TextToImage => &self.text_to_image,
            Capability::TextToSpeech => &self.text_to_speech,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub dashscope: FileProviderConfig,
    pub zhipu: FileProviderConfig,
    /// Any OpenAI-compatible chat-completions service
    pub openai: FileProviderConfig,
}

impl FileProvidersConfig {
    pub fn get(&self, provider: Provider) -> &FileProviderConfig {
        match provider {
            Provider::DashScope => &self.dashscope,
            Provider::Zhipu => &self.zhipu,
            Provider::OpenAiCompatible => &self.openai,
        }
    }
}
