//! generate_image tool: text-to-image through the async port and the task poller

use super::context::{ToolContext, approved_call, short_id};
use async_trait::async_trait;
use chrono::Utc;
use mmagent_application::{
    ImagePort, MediaDownloader, TaskPoller, Tool, ToolInvocationError, cancellable,
};
use mmagent_domain::{
    ApprovalOutcome, ArtifactKind, ImageGenInput, ToolCall, ToolDefinition, ToolParameter,
    ToolResult,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const GENERATE_IMAGE: &str = "generate_image";
pub const GENERATE_IMAGE_ACTION: &str = "ai.text2image";

const DEFAULT_SIZE: &str = "1024*1024";

pub fn generate_image_definition() -> ToolDefinition {
    ToolDefinition::new(
        GENERATE_IMAGE,
        "Generate an illustration from a text prompt and save it to the session's images.",
    )
    .with_action_type(GENERATE_IMAGE_ACTION)
    .with_parameter(ToolParameter::new("prompt", "Image description", true).with_type("string"))
    .with_parameter(
        ToolParameter::new("size", "Image size as W*H (default: 1024*1024)", false)
            .with_type("string"),
    )
    .with_parameter(ToolParameter::new("style", "Visual style", false).with_type("string"))
    .with_parameter(
        ToolParameter::new("negative_prompt", "What the image must not contain", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("sessionId", "Target session (default: current)", false)
            .with_type("string"),
    )
}

pub struct GenerateImageTool {
    definition: ToolDefinition,
    ctx: Arc<ToolContext>,
    port: Arc<ImagePort>,
    poller: TaskPoller,
    downloader: Arc<dyn MediaDownloader>,
}

impl GenerateImageTool {
    pub fn new(
        ctx: Arc<ToolContext>,
        port: Arc<ImagePort>,
        poller: TaskPoller,
        downloader: Arc<dyn MediaDownloader>,
    ) -> Self {
        Self {
            definition: generate_image_definition(),
            ctx,
            port,
            poller,
            downloader,
        }
    }
}

fn build_input(args: &ToolCall) -> Result<ImageGenInput, ToolInvocationError> {
    let prompt = args
        .require_string("prompt")
        .map_err(ToolInvocationError::InvalidArgument)?;
    let prompt = match args.get_string("style").map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => format!("{}. Style: {}", prompt.trim(), style),
        None => prompt.trim().to_string(),
    };

    let mut input = ImageGenInput::new(prompt)
        .with_parameter("size", args.get_string("size").unwrap_or(DEFAULT_SIZE));
    if let Some(negative) = args
        .get_string("negative_prompt")
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        input = input.with_parameter("negative_prompt", negative);
    }
    Ok(input)
}

#[async_trait]
impl Tool for GenerateImageTool {
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
            .approve(GENERATE_IMAGE_ACTION, call.arguments.clone(), cancel)
            .await?
        {
            ApprovalOutcome::Approved(payload) => payload,
            ApprovalOutcome::Denied { reason } => {
                return Ok(ToolResult::cancelled(
                    GENERATE_IMAGE,
                    "Image generation",
                    reason.as_deref(),
                ));
            }
        };
        let args = approved_call(call, payload);
        let session_id = self.ctx.session_id(&args.arguments);
        let input = build_input(&args)?;

        let image_url = self.poller.run(self.port.as_ref(), &input, cancel).await?;
        let bytes = cancellable(cancel, self.downloader.download(&image_url)).await?;

        let file_name = format!("image_{}_{}.png", Utc::now().timestamp_millis(), short_id());
        let path = ArtifactKind::Image.path_of(&file_name);
        self.ctx.store().write(&session_id, &path, &bytes).await?;
        self.ctx.report_progress(1, 1, &path);
        info!(session_id = %session_id, path = %path, "Image saved");

        let output = json!({
            "imagePath": path,
            "imageUrl": image_url,
            "sessionId": session_id,
        });
        Ok(ToolResult::success(GENERATE_IMAGE, output.to_string())
            .with_paths(vec![path])
            .with_bytes(bytes.len()))
    }
}
