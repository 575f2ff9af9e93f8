//! Raw TOML configuration data types
//!
//! These structs mirror the config file. Every section is `#[serde(default)]`
//! so a partial file (or none at all) still yields a usable configuration.

mod agent;
mod hitl;
mod providers;
mod runtime;
mod tools;
mod workspace;

pub use agent::FileAgentConfig;
pub use hitl::FileHitlConfig;
pub use providers::{FileCapabilityConfig, FileProviderConfig, FileProvidersConfig};
pub use runtime::{FilePollerConfig, FileRetryConfig, FileSpeechConfig};
pub use tools::FileToolsConfig;
pub use workspace::{FileLoggingConfig, FileWorkspaceConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("poller.interval_ms cannot be 0")]
    ZeroPollInterval,

    #[error("poller.max_attempts cannot be 0")]
    ZeroPollAttempts,

    #[error("hitl rule has an empty action_type")]
    EmptyActionType,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub agent: FileAgentConfig,
    /// Credentials and endpoint overrides per provider
    pub providers: FileProvidersConfig,
    pub poller: FilePollerConfig,
    pub retry: FileRetryConfig,
    pub speech: FileSpeechConfig,
    /// Rule overrides layered on the built-in approval policy
    pub hitl: FileHitlConfig,
    pub tools: FileToolsConfig,
    pub workspace: FileWorkspaceConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.poller.interval_ms == 0 {
            return Err(ConfigValidationError::ZeroPollInterval);
        }
        if self.poller.max_attempts == 0 {
            return Err(ConfigValidationError::ZeroPollAttempts);
        }
        if self.hitl.rules.iter().any(|r| r.action_type.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyActionType);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmagent_domain::{Priority, Provider};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[agent]
provider = "zhipu"
multimodal_provider = "dashscope"
default_session = "demo"

[providers.zhipu]
api_key = "zk-123"
base_url = "https://proxy.example.com/v4/"

[providers.zhipu.text_to_image]
model = "cogview-4"

[poller]
interval_ms = 500
max_attempts = 10

[retry]
max_retries = 1
base_ms = 100

[speech]
rate_limit_ms = 500

[hitl]
enabled = true

[[hitl.rules]]
action_type = "ai.text2image"
enabled = true
priority = "high"
require_approval = true

[tools]
describe_image = false

[workspace]
root = "/tmp/mm"

[logging]
audit_log = "/tmp/mm/audit.jsonl"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agent.provider, Provider::Zhipu);
        assert_eq!(config.agent.multimodal_provider, Some(Provider::DashScope));
        assert_eq!(config.providers.zhipu.api_key.as_deref(), Some("zk-123"));
        assert_eq!(
            config.providers.zhipu.text_to_image.model.as_deref(),
            Some("cogview-4")
        );
        assert_eq!(config.poller.interval_ms, 500);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.speech.rate_limit_ms, 500);
        assert_eq!(config.speech.first_line_number, 6000);
        assert_eq!(config.hitl.rules[0].priority, Priority::High);
        assert!(!config.tools.is_enabled("describe_image"));
        assert!(config.tools.is_enabled("generate_image"));
        assert_eq!(config.workspace.root.to_string_lossy(), "/tmp/mm");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.poller.interval_ms, 2000);
        assert_eq!(config.poller.max_attempts, 60);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_ms, 5000);
        assert_eq!(config.speech.rate_limit_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_poller_values() {
        let mut config = FileConfig::default();
        config.poller.interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroPollInterval));

        let mut config = FileConfig::default();
        config.poller.max_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroPollAttempts));
    }
}
