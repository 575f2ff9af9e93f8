//! Agent configuration from TOML (`[agent]` section)

use mmagent_domain::{Capability, Provider};
use serde::{Deserialize, Serialize};

/// Provider selection
///
/// # Example
///
/// ```toml
/// [agent]
/// provider = "dashscope"            # text model vendor
/// multimodal_provider = "zhipu"     # vision / image / speech vendor (defaults to `provider`)
/// default_session = "default"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multimodal_provider: Option<Provider>,
    /// Session directory used when the CLI is not given one
    pub default_session: String,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            provider: Provider::DashScope,
            multimodal_provider: None,
            default_session: "default".to_string(),
        }
    }
}

impl FileAgentConfig {
    /// Vendor to use for a capability.
    pub fn provider_for(&self, capability: Capability) -> Provider {
        match capability {
            Capability::Text => self.provider,
            Capability::Vision | Capability::TextToImage | Capability::TextToSpeech => {
                self.multimodal_provider.unwrap_or(self.provider)
            }
        }
    }
}
