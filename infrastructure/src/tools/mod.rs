//! Tool implementations and the registry that serves them
//!
//! Every tool asks the approval broker before its side effect, then calls
//! an inference port and writes the result to the session's artifacts:
//!
//! - `generate_image`: async text-to-image port through the task poller
//! - `edit_image`: image edit port on reference images from the session
//! - `synthesize_speech`: speech port under the retry policy, paced and
//!   numbered through the line ledger
//! - `describe_image`: vision port on an image from the session
//! - `delete_artifacts`: no port; removes confirmed images and audio

mod context;
mod delete_artifacts;
mod describe_image;
mod edit_image;
mod generate_image;
mod registry;
mod synthesize_speech;

pub use context::{SESSION_ID_KEY, ToolContext};
pub use delete_artifacts::{
    DELETE_ARTIFACTS, DELETE_ARTIFACTS_ACTION, DeleteArtifactsTool, delete_artifacts_definition,
};
pub use describe_image::{
    DESCRIBE_IMAGE, DESCRIBE_IMAGE_ACTION, DescribeImageTool, describe_image_definition,
};
pub use edit_image::{EDIT_IMAGE, EDIT_IMAGE_ACTION, EditImageTool, edit_image_definition};
pub use generate_image::{
    GENERATE_IMAGE, GENERATE_IMAGE_ACTION, GenerateImageTool, generate_image_definition,
};
pub use registry::{RegistryStats, ToolFactory, ToolRegistry};
pub use synthesize_speech::{
    SYNTHESIZE_SPEECH, SYNTHESIZE_SPEECH_ACTION, SynthesizeSpeechTool,
    synthesize_speech_definition,
};

use crate::config::{FileAgentConfig, FileSpeechConfig, FileToolsConfig};
use crate::providers::PortFactory;
use mmagent_application::{
    LineLedger, MediaDownloader, PollerConfig, RetryPolicy, RetryingSyncPort, TaskPoller, Tool,
};
use mmagent_domain::Capability;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the built-in tools are made from.
#[derive(Clone)]
pub struct ToolDeps {
    pub ctx: Arc<ToolContext>,
    pub ports: Arc<PortFactory>,
    pub agent: FileAgentConfig,
    pub poller: PollerConfig,
    pub retry: RetryPolicy,
    pub speech: FileSpeechConfig,
    pub downloader: Arc<dyn MediaDownloader>,
    /// Workspace-wide line numbers for synthesized speech.
    pub ledger: Arc<dyn LineLedger>,
    /// Aborts retry backoff waits.
    pub cancel: CancellationToken,
}

/// Registry with the built-in tools, not yet built.
pub fn default_registry(deps: ToolDeps, toggles: FileToolsConfig) -> ToolRegistry {
    let propagator = deps.ctx.propagator().clone();

    let d = deps.clone();
    let registry = ToolRegistry::new(propagator).with_toggles(toggles).register(
        GENERATE_IMAGE,
        move || {
            let port = d.ports.image(d.agent.provider_for(Capability::TextToImage))?;
            Ok(Arc::new(GenerateImageTool::new(
                d.ctx.clone(),
                port,
                TaskPoller::new(d.poller),
                d.downloader.clone(),
            )) as Arc<dyn Tool>)
        },
    );

    let d = deps.clone();
    let registry = registry.register(EDIT_IMAGE, move || {
        let port = d.ports.image_edit(
            d.agent.provider_for(Capability::TextToImage),
            TaskPoller::new(d.poller),
        )?;
        let tool = EditImageTool::new(d.ctx.clone(), port, d.downloader.clone());
        Ok(Arc::new(tool) as Arc<dyn Tool>)
    });

    let d = deps.clone();
    let registry = registry.register(SYNTHESIZE_SPEECH, move || {
        let port = d.ports.speech(d.agent.provider_for(Capability::TextToSpeech))?;
        let port = RetryingSyncPort::new(port, d.retry).with_cancellation(d.cancel.clone());
        let tool = SynthesizeSpeechTool::new(
            d.ctx.clone(),
            Arc::new(port),
            d.downloader.clone(),
            d.ledger.clone(),
        )
        .with_rate_limit(d.speech.rate_limit());
        Ok(Arc::new(tool) as Arc<dyn Tool>)
    });

    let d = deps.clone();
    let registry = registry.register(DESCRIBE_IMAGE, move || {
        let port = d.ports.vision(d.agent.provider_for(Capability::Vision))?;
        Ok(Arc::new(DescribeImageTool::new(d.ctx.clone(), port)) as Arc<dyn Tool>)
    });

    let ctx = deps.ctx;
    registry.register(DELETE_ARTIFACTS, move || {
        Ok(Arc::new(DeleteArtifactsTool::new(ctx.clone())) as Arc<dyn Tool>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::JsonLineLedger;
    use crate::providers::ProviderSettings;
    use mmagent_application::ToolExecutorPort;
    use mmagent_domain::Provider;

    fn deps(root: &std::path::Path, ports: PortFactory) -> ToolDeps {
        ToolDeps {
            ctx: context::test_support::context(root),
            ports: Arc::new(ports),
            agent: FileAgentConfig::default(),
            poller: PollerConfig::default(),
            retry: RetryPolicy::none(),
            speech: FileSpeechConfig::default(),
            downloader: context::test_support::FakeDownloader::new(b""),
            ledger: Arc::new(JsonLineLedger::new(root, 6000)),
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn test_all_tools_with_configured_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ProviderSettings::builtin(Provider::DashScope);
        settings.api_key = Some("sk-test".to_string());
        let ports = PortFactory::from_settings(reqwest::Client::new(), [settings]);

        let mut registry = default_registry(deps(dir.path(), ports), FileToolsConfig::default());
        assert_eq!(registry.build(), 5);

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                GENERATE_IMAGE,
                EDIT_IMAGE,
                SYNTHESIZE_SPEECH,
                DESCRIBE_IMAGE,
                DELETE_ARTIFACTS
            ]
        );
    }

    #[test]
    fn test_missing_key_leaves_only_local_tools() {
        let dir = tempfile::tempdir().unwrap();
        let ports = PortFactory::from_settings(
            reqwest::Client::new(),
            [ProviderSettings::builtin(Provider::DashScope)],
        );
        let mut toggles = FileToolsConfig::default();
        toggles.enabled.insert(DESCRIBE_IMAGE.to_string(), false);

        let mut registry = default_registry(deps(dir.path(), ports), toggles);
        registry.build();

        let stats = registry.stats();
        assert_eq!(stats.available, 1);
        assert!(registry.has_tool(DELETE_ARTIFACTS));
        assert_eq!(stats.disabled, vec![DESCRIBE_IMAGE.to_string()]);
        assert_eq!(
            stats.failed,
            vec![
                GENERATE_IMAGE.to_string(),
                EDIT_IMAGE.to_string(),
                SYNTHESIZE_SPEECH.to_string()
            ]
        );
    }
}
