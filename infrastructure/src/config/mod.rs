//! Configuration file loading
//!
//! Sources are merged in this order (later wins):
//!
//! 1. Built-in defaults
//! 2. Global: `$XDG_CONFIG_HOME/mmagent/config.toml` (or `~/.config/mmagent/config.toml`)
//! 3. Project: `./mmagent.toml` or `./.mmagent.toml`
//! 4. `--config <path>`
//! 5. `MMAGENT_*` environment variables (`MMAGENT_POLLER__INTERVAL_MS=500`)

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentConfig, FileCapabilityConfig, FileConfig, FileHitlConfig,
    FileLoggingConfig, FilePollerConfig, FileProviderConfig, FileProvidersConfig,
    FileRetryConfig, FileSpeechConfig, FileToolsConfig, FileWorkspaceConfig,
};
pub use loader::ConfigLoader;
