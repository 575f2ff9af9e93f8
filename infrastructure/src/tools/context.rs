//! Dependencies shared by every tool

use mmagent_application::{ApprovalBroker, ApprovalError, ArtifactStore, RunContextPropagator};
use mmagent_domain::{ApprovalOutcome, Payload, ToolCall};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Payload key a caller may set to target a specific session.
pub const SESSION_ID_KEY: &str = "sessionId";

/// Approval broker, run context and artifact store, bundled for tools.
pub struct ToolContext {
    broker: Arc<ApprovalBroker>,
    propagator: Arc<RunContextPropagator>,
    store: Arc<dyn ArtifactStore>,
    default_session: String,
}

impl ToolContext {
    pub fn new(
        broker: Arc<ApprovalBroker>,
        propagator: Arc<RunContextPropagator>,
        store: Arc<dyn ArtifactStore>,
        default_session: impl Into<String>,
    ) -> Self {
        Self {
            broker,
            propagator,
            store,
            default_session: default_session.into(),
        }
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub fn propagator(&self) -> &Arc<RunContextPropagator> {
        &self.propagator
    }

    /// Ask for approval on behalf of the current run.
    pub async fn approve(
        &self,
        action_type: &str,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        let run = self.propagator.current();
        let thread_id = run.as_ref().map(|ctx| ctx.thread_id.as_str());
        self.broker
            .request_approval(action_type, payload, thread_id, cancel)
            .await
    }

    /// `sessionId` from the payload, or the configured default.
    pub fn session_id(&self, payload: &Payload) -> String {
        payload
            .get(SESSION_ID_KEY)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.default_session)
            .to_string()
    }

    /// Report progress to the current run, if there is one.
    pub fn report_progress(&self, current: usize, total: usize, path: &str) {
        match self.propagator.current() {
            Some(ctx) => {
                ctx.report(current, total, path);
            }
            None => debug!(current, total, path, "No run context for progress"),
        }
    }
}

/// `call` with its arguments replaced by the approved payload.
pub(crate) fn approved_call(call: &ToolCall, payload: Payload) -> ToolCall {
    ToolCall {
        id: call.id.clone(),
        tool_name: call.tool_name.clone(),
        message_id: call.message_id.clone(),
        arguments: payload,
    }
}

/// Eight hex chars for unique artifact names.
pub(crate) fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::artifacts::FsArtifactStore;
    use async_trait::async_trait;
    use mmagent_application::{InferenceError, MediaDownloader, NoApprovalChannel, NoAuditLogger};
    use mmagent_domain::HitlPolicy;
    use std::sync::Mutex;

    /// Returns `body` for every URL and records what was asked for.
    pub struct FakeDownloader {
        pub body: Vec<u8>,
        pub urls: Mutex<Vec<String>>,
    }

    impl FakeDownloader {
        pub fn new(body: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_vec(),
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MediaDownloader for FakeDownloader {
        async fn download(&self, url: &str) -> Result<Vec<u8>, InferenceError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    /// Context over a temp workspace with approvals switched off.
    pub fn context(root: &std::path::Path) -> Arc<ToolContext> {
        context_with_policy(root, HitlPolicy::disabled())
    }

    pub fn context_with_policy(root: &std::path::Path, policy: HitlPolicy) -> Arc<ToolContext> {
        let broker = Arc::new(ApprovalBroker::new(
            policy,
            Arc::new(NoApprovalChannel),
            Arc::new(NoAuditLogger),
        ));
        Arc::new(ToolContext::new(
            broker,
            Arc::new(RunContextPropagator::new()),
            Arc::new(FsArtifactStore::new(root)),
            "s1",
        ))
    }

    pub fn broker_of(ctx: &ToolContext) -> &ApprovalBroker {
        &ctx.broker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_id_shape() {
        let id = short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, short_id());
    }

    #[test]
    fn test_session_id_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_support::context(dir.path());

        let mut payload = Payload::new();
        assert_eq!(ctx.session_id(&payload), "s1");
        payload.insert(SESSION_ID_KEY.to_string(), json!("  "));
        assert_eq!(ctx.session_id(&payload), "s1");
        payload.insert(SESSION_ID_KEY.to_string(), json!("book-7"));
        assert_eq!(ctx.session_id(&payload), "book-7");
    }
}
