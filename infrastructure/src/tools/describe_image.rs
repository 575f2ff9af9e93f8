//! describe_image tool: dialogue script from an illustration
//!
//! Reads an image from the session, sends it to the vision model as a data
//! URL and stores the reply under `scripts/<image stem>.json`.

use super::context::{ToolContext, approved_call};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use mmagent_application::{Tool, ToolInvocationError, VisionPort, cancellable};
use mmagent_domain::{
    ApprovalOutcome, ArtifactKind, ToolCall, ToolDefinition, ToolParameter, ToolResult,
    VisionInput,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const DESCRIBE_IMAGE: &str = "describe_image";
pub const DESCRIBE_IMAGE_ACTION: &str = "ai.vl_script";

pub const DEFAULT_SCRIPT_PROMPT: &str = "You are a dialogue designer for an audio picture book. \
Find the elements in the picture and write one line of dialogue for each. \
Return only a JSON list of lines with the coordinates of their element, origin at the top-left \
corner of the image, in the form [{\"text\": \"line\", \"x\": \"x\", \"y\": \"y\"}].";

pub fn describe_image_definition() -> ToolDefinition {
    ToolDefinition::new(
        DESCRIBE_IMAGE,
        "Write dialogue lines with coordinates for an image using the vision model.",
    )
    .with_action_type(DESCRIBE_IMAGE_ACTION)
    .with_parameter(
        ToolParameter::new("imagePath", "Image path relative to the session", true)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("userPrompt", "Extra instructions for the script", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("sessionId", "Target session (default: current)", false)
            .with_type("string"),
    )
}

/// MIME type from the file extension; PNG when unknown.
pub(crate) fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

pub(crate) fn data_url(path: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes))
}

pub struct DescribeImageTool {
    definition: ToolDefinition,
    ctx: Arc<ToolContext>,
    port: Arc<VisionPort>,
    prompt: String,
}

impl DescribeImageTool {
    pub fn new(ctx: Arc<ToolContext>, port: Arc<VisionPort>) -> Self {
        Self {
            definition: describe_image_definition(),
            ctx,
            port,
            prompt: DEFAULT_SCRIPT_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    fn prompt_for(&self, user_prompt: Option<&str>) -> String {
        match user_prompt.map(str::trim).filter(|s| !s.is_empty()) {
            Some(extra) => format!("{}\n\nAdditional requirements: {}", self.prompt, extra),
            None => self.prompt.clone(),
        }
    }
}

#[async_trait]
impl Tool for DescribeImageTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolInvocationError> {
        let payload = match self
            .ctx
            .approve(DESCRIBE_IMAGE_ACTION, call.arguments.clone(), cancel)
            .await?
        {
            ApprovalOutcome::Approved(payload) => payload,
            ApprovalOutcome::Denied { reason } => {
                return Ok(ToolResult::cancelled(
                    DESCRIBE_IMAGE,
                    "Script generation",
                    reason.as_deref(),
                ));
            }
        };
        let args = approved_call(call, payload);
        let image_path = args
            .require_string("imagePath")
            .map_err(ToolInvocationError::InvalidArgument)?
            .trim()
            .to_string();
        let session_id = self.ctx.session_id(&args.arguments);

        let image = self.ctx.store().read(&session_id, &image_path).await?;
        let input = VisionInput {
            data_url: data_url(&image_path, &image),
            prompt: self.prompt_for(args.get_string("userPrompt")),
        };
        let script = cancellable(cancel, self.port.execute(&input)).await?;

        let stem = Path::new(&image_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("script");
        let script_path = ArtifactKind::Script.path_of(&format!("{}.json", stem));
        self.ctx
            .store()
            .write(&session_id, &script_path, script.as_bytes())
            .await?;
        self.ctx.report_progress(1, 1, &script_path);
        info!(session_id = %session_id, path = %script_path, "Script saved");

        let output = json!({
            "scriptPath": script_path,
            "script": script,
            "sessionId": session_id,
        });
        Ok(ToolResult::success(DESCRIBE_IMAGE, output.to_string()).with_paths(vec![script_path]))
    }
}
