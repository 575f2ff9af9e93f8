//! delete_artifacts tool: remove generated images and audio after confirmation

use super::context::{SESSION_ID_KEY, ToolContext, approved_call};
use async_trait::async_trait;
use mmagent_application::{Tool, ToolInvocationError};
use mmagent_domain::{
    ApprovalOutcome, ArtifactKind, Payload, ToolCall, ToolDefinition, ToolParameter, ToolResult,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DELETE_ARTIFACTS: &str = "delete_artifacts";
pub const DELETE_ARTIFACTS_ACTION: &str = "artifacts.delete";

pub fn delete_artifacts_definition() -> ToolDefinition {
    ToolDefinition::new(
        DELETE_ARTIFACTS,
        "Delete generated images and audio from a session. The user confirms the final list.",
    )
    .with_action_type(DELETE_ARTIFACTS_ACTION)
    .with_parameter(
        ToolParameter::new("category", "images, audio or both (default: both)", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("paths", "Specific paths to delete instead of a whole category", false)
            .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new("sessionId", "Target session (default: current)", false)
            .with_type("string"),
    )
}

fn kinds_for(category: Option<&str>) -> Result<Vec<ArtifactKind>, ToolInvocationError> {
    match category.map(str::trim).unwrap_or("both") {
        "images" | "image" => Ok(vec![ArtifactKind::Image]),
        "audio" => Ok(vec![ArtifactKind::Audio]),
        "both" | "" => Ok(ArtifactKind::deletable().to_vec()),
        other => Err(ToolInvocationError::InvalidArgument(format!(
            "Unknown category: {} (expected images, audio or both)",
            other
        ))),
    }
}

/// Session-relative form of `path`; a leading `<session>/` is dropped.
fn relative_to_session(session_id: &str, path: &str) -> String {
    let path = path.trim().trim_start_matches('/');
    path.strip_prefix(session_id)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
        .to_string()
}

fn is_deletable(path: &str) -> bool {
    ArtifactKind::deletable()
        .iter()
        .any(|kind| path.starts_with(&format!("{}/", kind.dir())))
}

pub struct DeleteArtifactsTool {
    definition: ToolDefinition,
    ctx: Arc<ToolContext>,
}

impl DeleteArtifactsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self {
            definition: delete_artifacts_definition(),
            ctx,
        }
    }

    async fn candidates(
        &self,
        session_id: &str,
        args: &ToolCall,
    ) -> Result<Vec<String>, ToolInvocationError> {
        if let Some(paths) = args
            .get_string_list("paths")
            .map_err(ToolInvocationError::InvalidArgument)?
            .filter(|paths| !paths.is_empty())
        {
            return Ok(paths
                .iter()
                .map(|p| relative_to_session(session_id, p))
                .filter(|p| !p.is_empty())
                .collect());
        }

        let mut paths = Vec::new();
        for kind in kinds_for(args.get_string("category"))? {
            let entries = self.ctx.store().list(session_id, kind.dir()).await?;
            paths.extend(
                entries
                    .into_iter()
                    .filter(|entry| !entry.is_dir)
                    .map(|entry| kind.path_of(&entry.name)),
            );
        }
        Ok(paths)
    }
}

#[async_trait]
impl Tool for DeleteArtifactsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolInvocationError> {
        let session_id = self.ctx.session_id(&call.arguments);
        let candidates = self.candidates(&session_id, call).await?;
        if candidates.is_empty() {
            let output = json!({ "deleted": [], "message": "Nothing to delete" });
            return Ok(ToolResult::success(DELETE_ARTIFACTS, output.to_string()));
        }

        let mut payload = Payload::new();
        payload.insert(SESSION_ID_KEY.to_string(), Value::from(session_id.clone()));
        payload.insert("paths".to_string(), Value::from(candidates.clone()));
        let approved = match self
            .ctx
            .approve(DELETE_ARTIFACTS_ACTION, payload, cancel)
            .await?
        {
            ApprovalOutcome::Approved(payload) => payload,
            ApprovalOutcome::Denied { reason } => {
                return Ok(ToolResult::cancelled(
                    DELETE_ARTIFACTS,
                    "Deletion",
                    reason.as_deref(),
                ));
            }
        };
        let approved = approved_call(call, approved);
        // The approver may retarget the deletion at another session.
        let session_id = match approved
            .get_string(SESSION_ID_KEY)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(edited) if edited != session_id => {
                info!(listed = %session_id, approved = %edited, "Deletion moved to another session");
                edited.to_string()
            }
            _ => session_id,
        };
        let confirmed = approved
            .get_string_list("paths")
            .map_err(ToolInvocationError::InvalidArgument)?
            .unwrap_or(candidates);
        if confirmed.is_empty() {
            let output = json!({ "deleted": [], "message": "Deletion cancelled by user" });
            return Ok(ToolResult::success(DELETE_ARTIFACTS, output.to_string()));
        }

        let mut deleted = Vec::new();
        let mut skipped = Vec::new();
        for path in confirmed {
            if cancel.is_cancelled() {
                return Err(ToolInvocationError::Cancelled);
            }
            let path = relative_to_session(&session_id, &path);
            if !is_deletable(&path) {
                warn!(path = %path, "Refusing to delete outside images/ and audio/");
                skipped.push(path);
                continue;
            }
            match self.ctx.store().delete(&session_id, &path).await {
                Ok(()) => deleted.push(path),
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to delete artifact");
                    skipped.push(path);
                }
            }
        }
        info!(session_id = %session_id, deleted = deleted.len(), "Artifacts deleted");

        let message = format!("Deleted {} file(s)", deleted.len());
        let output = json!({
            "deleted": deleted,
            "skipped": skipped,
            "message": message,
        });
        Ok(ToolResult::success(DELETE_ARTIFACTS, output.to_string()).with_paths(deleted))
    }
}
