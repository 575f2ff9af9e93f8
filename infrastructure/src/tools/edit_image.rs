//! edit_image tool: new image from a prompt and reference images in the session

use super::context::{ToolContext, approved_call, short_id};
use super::describe_image::data_url;
use async_trait::async_trait;
use chrono::Utc;
use mmagent_application::{
    ImageEditPort, MediaDownloader, Tool, ToolInvocationError, cancellable,
};
use mmagent_domain::{
    ApprovalOutcome, ArtifactKind, ImageEditInput, ToolCall, ToolDefinition, ToolParameter,
    ToolResult,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const EDIT_IMAGE: &str = "edit_image";
pub const EDIT_IMAGE_ACTION: &str = "ai.image_edit";

const DEFAULT_SIZE: &str = "1280*1280";
const MAX_COUNT: u64 = 4;

pub fn edit_image_definition() -> ToolDefinition {
    ToolDefinition::new(
        EDIT_IMAGE,
        "Edit one or more images from the session with a prompt and save the result.",
    )
    .with_action_type(EDIT_IMAGE_ACTION)
    .with_parameter(ToolParameter::new("prompt", "Edit instructions", false).with_type("string"))
    .with_parameter(
        ToolParameter::new("promptFile", "Session file holding the prompt", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("imagePath", "Reference image relative to the session", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("imagePaths", "Several reference images", false).with_type("array"),
    )
    .with_parameter(
        ToolParameter::new("size", "Output size as W*H (default: 1280*1280)", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("count", "Images to generate, 1 to 4 (default: 1)", false)
            .with_type("integer"),
    )
    .with_parameter(ToolParameter::new("model", "Edit model override", false).with_type("string"))
    .with_parameter(
        ToolParameter::new("promptExtend", "Let the model rewrite the prompt (default: true)", false)
            .with_type("boolean"),
    )
    .with_parameter(
        ToolParameter::new("watermark", "Add the vendor watermark (default: false)", false)
            .with_type("boolean"),
    )
    .with_parameter(
        ToolParameter::new("sessionId", "Target session (default: current)", false)
            .with_type("string"),
    )
}

pub struct EditImageTool {
    definition: ToolDefinition,
    ctx: Arc<ToolContext>,
    port: Arc<ImageEditPort>,
    downloader: Arc<dyn MediaDownloader>,
}

impl EditImageTool {
    pub fn new(
        ctx: Arc<ToolContext>,
        port: Arc<ImageEditPort>,
        downloader: Arc<dyn MediaDownloader>,
    ) -> Self {
        Self {
            definition: edit_image_definition(),
            ctx,
            port,
            downloader,
        }
    }

    /// `prompt`, or the contents of `promptFile`.
    async fn prompt(&self, args: &ToolCall, session_id: &str) -> Result<String, ToolInvocationError> {
        if let Some(prompt) = args.get_string("prompt").map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(prompt.to_string());
        }
        let Some(file) = args.get_string("promptFile").filter(|f| !f.trim().is_empty()) else {
            return Err(ToolInvocationError::InvalidArgument(
                "Either prompt or promptFile must be provided".to_string(),
            ));
        };
        let bytes = self.ctx.store().read(session_id, file.trim()).await?;
        let prompt = String::from_utf8_lossy(&bytes).trim().to_string();
        if prompt.is_empty() {
            return Err(ToolInvocationError::InvalidArgument(format!(
                "Prompt file {} is empty",
                file
            )));
        }
        Ok(prompt)
    }
}

/// `imagePaths` if it names any image, else `imagePath`.
fn image_paths(args: &ToolCall) -> Result<Vec<String>, ToolInvocationError> {
    let listed: Vec<String> = args
        .get_string_list("imagePaths")
        .map_err(ToolInvocationError::InvalidArgument)?
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if !listed.is_empty() {
        return Ok(listed);
    }
    match args.get_string("imagePath").map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => Ok(vec![path.to_string()]),
        None => Err(ToolInvocationError::InvalidArgument(
            "Either imagePath or imagePaths must be provided".to_string(),
        )),
    }
}

fn with_parameters(input: ImageEditInput, args: &ToolCall) -> ImageEditInput {
    let input = input
        .with_parameter("size", args.get_string("size").unwrap_or(DEFAULT_SIZE))
        .with_parameter("n", args.get_u64("count").unwrap_or(1).clamp(1, MAX_COUNT))
        .with_parameter("prompt_extend", args.get_bool("promptExtend").unwrap_or(true))
        .with_parameter("watermark", args.get_bool("watermark").unwrap_or(false));
    match args.get_string("model").map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => input.with_model(model),
        None => input,
    }
}

#[async_trait]
impl Tool for EditImageTool {
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
            .approve(EDIT_IMAGE_ACTION, call.arguments.clone(), cancel)
            .await?
        {
            ApprovalOutcome::Approved(payload) => payload,
            ApprovalOutcome::Denied { reason } => {
                return Ok(ToolResult::cancelled(
                    EDIT_IMAGE,
                    "Image editing",
                    reason.as_deref(),
                ));
            }
        };
        let args = approved_call(call, payload);
        let session_id = self.ctx.session_id(&args.arguments);
        let prompt = self.prompt(&args, &session_id).await?;
        let sources = image_paths(&args)?;

        let mut images = Vec::with_capacity(sources.len());
        for path in &sources {
            let bytes = self.ctx.store().read(&session_id, path).await?;
            images.push(data_url(path, &bytes));
        }
        let input = with_parameters(ImageEditInput::new(prompt, images), &args);

        let image_url = cancellable(cancel, self.port.execute(&input)).await?;
        let bytes = cancellable(cancel, self.downloader.download(&image_url)).await?;

        let file_name = format!("edit_{}_{}.png", Utc::now().timestamp_millis(), short_id());
        let path = ArtifactKind::Image.path_of(&file_name);
        self.ctx.store().write(&session_id, &path, &bytes).await?;
        self.ctx.report_progress(1, 1, &path);
        info!(session_id = %session_id, path = %path, sources = sources.len(), "Edited image saved");

        let output = json!({
            "imagePath": path,
            "imageUrl": image_url,
            "sourcePaths": sources,
            "sessionId": session_id,
        });
        Ok(ToolResult::success(EDIT_IMAGE, output.to_string())
            .with_paths(vec![path])
            .with_bytes(bytes.len()))
    }
}
