//! Infrastructure layer for mmagent
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: provider HTTP adapters and the port factory,
//! configuration file loading, the filesystem artifact store, approval
//! transport, audit logging, media download and the tools.

pub mod approval;
pub mod artifacts;
pub mod config;
pub mod logging;
pub mod media;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use approval::MpscApprovalChannel;
pub use artifacts::{FsArtifactStore, JsonLineLedger};
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileConfig, FileHitlConfig,
    FileLoggingConfig, FilePollerConfig, FileProvidersConfig, FileRetryConfig, FileSpeechConfig,
    FileToolsConfig, FileWorkspaceConfig,
};
pub use logging::JsonlAuditLogger;
pub use media::{HttpMediaDownloader, pcm_to_wav};
pub use providers::{PortFactory, ProviderSettings};
pub use tools::{RegistryStats, ToolContext, ToolDeps, ToolRegistry, default_registry};
