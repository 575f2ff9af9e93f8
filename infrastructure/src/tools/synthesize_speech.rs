//! synthesize_speech tool: one audio file per line of dialogue
//!
//! Lines are numbered workspace-wide (`audio/6000_<text>.wav`, ...) from the
//! line ledger, so numbers never repeat across sessions. Synthesis is
//! serialized process-wide and paced: providers rate-limit per account.

use super::context::{ToolContext, approved_call};
use crate::media::pcm_to_wav;
use async_trait::async_trait;
use mmagent_application::{
    InferenceError, LineLedger, MediaDownloader, SpeechPort, Tool, ToolInvocationError,
    cancellable, cancellable_sleep,
};
use mmagent_domain::core::string::sanitize_for_filename;
use mmagent_domain::{
    ApprovalOutcome, ArtifactKind, LineEntry, SpeechInput, SpeechOutput, ToolCall,
    ToolDefinition, ToolParameter, ToolResult,
};
use serde_json::json;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SYNTHESIZE_SPEECH: &str = "synthesize_speech";
pub const SYNTHESIZE_SPEECH_ACTION: &str = "ai.text2speech";

const DEFAULT_VOICE: &str = "chinese_female";
const DEFAULT_FORMAT: &str = "mp3";
const MAX_STEM_CHARS: usize = 40;
/// Record of the texts the user confirmed, relative to the session.
const CONFIRMED_LINES_PATH: &str = "lines/tts_confirmed.json";

static SYNTHESIS_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub fn synthesize_speech_definition() -> ToolDefinition {
    ToolDefinition::new(
        SYNTHESIZE_SPEECH,
        "Synthesize one audio file per line of text into the session's audio directory.",
    )
    .with_action_type(SYNTHESIZE_SPEECH_ACTION)
    .with_parameter(ToolParameter::new("texts", "Lines to speak", true).with_type("array"))
    .with_parameter(
        ToolParameter::new("voice", "Voice alias (default: chinese_female)", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("format", "Extension for downloaded audio (default: mp3)", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("sessionId", "Target session (default: current)", false)
            .with_type("string"),
    )
}

pub struct SynthesizeSpeechTool {
    definition: ToolDefinition,
    ctx: Arc<ToolContext>,
    port: Arc<SpeechPort>,
    downloader: Arc<dyn MediaDownloader>,
    ledger: Arc<dyn LineLedger>,
    rate_limit: Duration,
}

impl SynthesizeSpeechTool {
    /// `port` should already carry the retry policy.
    pub fn new(
        ctx: Arc<ToolContext>,
        port: Arc<SpeechPort>,
        downloader: Arc<dyn MediaDownloader>,
        ledger: Arc<dyn LineLedger>,
    ) -> Self {
        Self {
            definition: synthesize_speech_definition(),
            ctx,
            port,
            downloader,
            ledger,
            rate_limit: Duration::ZERO,
        }
    }

    /// Pause before every line after the first.
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Audio bytes and the extension they should be stored under.
    async fn render(
        &self,
        output: SpeechOutput,
        format: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, String), ToolInvocationError> {
        match output {
            SpeechOutput::Pcm {
                bytes,
                sample_rate,
                channels,
            } => Ok((pcm_to_wav(&bytes, sample_rate, channels), "wav".to_string())),
            SpeechOutput::AudioUrl(url) => {
                let bytes = cancellable(cancel, self.downloader.download(&url)).await?;
                Ok((bytes, format.to_string()))
            }
        }
    }
}

#[async_trait]
impl Tool for SynthesizeSpeechTool {
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
            .approve(SYNTHESIZE_SPEECH_ACTION, call.arguments.clone(), cancel)
            .await?
        {
            ApprovalOutcome::Approved(payload) => payload,
            ApprovalOutcome::Denied { reason } => {
                return Ok(ToolResult::cancelled(
                    SYNTHESIZE_SPEECH,
                    "Speech synthesis",
                    reason.as_deref(),
                ));
            }
        };
        let args = approved_call(call, payload);
        let texts: Vec<String> = args
            .get_string_list("texts")
            .map_err(ToolInvocationError::InvalidArgument)?
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            return Err(ToolInvocationError::InvalidArgument(
                "texts must contain at least one non-empty line".to_string(),
            ));
        }
        let voice = args.get_string("voice").unwrap_or(DEFAULT_VOICE).to_string();
        let format = args.get_string("format").unwrap_or(DEFAULT_FORMAT).to_string();
        let session_id = self.ctx.session_id(&args.arguments);

        let _serialized = cancellable(cancel, async {
            Ok::<_, InferenceError>(SYNTHESIS_LOCK.lock().await)
        })
        .await?;
        debug!(session_id = %session_id, lines = texts.len(), "Synthesis lock acquired");

        let confirmed = serde_json::to_vec_pretty(&texts).unwrap_or_default();
        self.ctx
            .store()
            .write(&session_id, CONFIRMED_LINES_PATH, &confirmed)
            .await?;

        let numbers = self.ledger.read().await?.reserve(texts.len());
        let total = texts.len();
        let mut paths = Vec::with_capacity(total);
        let mut entries = Vec::with_capacity(total);
        let mut written = 0;

        for (i, (text, &number)) in texts.iter().zip(&numbers).enumerate() {
            if i > 0 && !self.rate_limit.is_zero() {
                cancellable_sleep(cancel, self.rate_limit).await?;
            }
            let input = SpeechInput {
                text: text.clone(),
                voice: voice.clone(),
            };
            let output = cancellable(cancel, self.port.execute(&input)).await?;
            let (bytes, ext) = self.render(output, &format, cancel).await?;

            let file_name = format!(
                "{}_{}.{}",
                number,
                sanitize_for_filename(text, MAX_STEM_CHARS),
                ext
            );
            let path = ArtifactKind::Audio.path_of(&file_name);
            self.ctx.store().write(&session_id, &path, &bytes).await?;
            written += bytes.len();
            self.ctx.report_progress(i + 1, total, &path);
            debug!(path = %path, "Line synthesized");

            entries.push(LineEntry {
                number,
                session_id: session_id.clone(),
                relative_path: path.clone(),
                text: text.clone(),
            });
            paths.push(path);
        }
        self.ledger.append(entries).await?;

        info!(session_id = %session_id, lines = total, "Speech synthesized");
        let output = json!({
            "audioPaths": paths,
            "numbers": numbers,
            "sessionId": session_id,
        });
        Ok(ToolResult::success(SYNTHESIZE_SPEECH, output.to_string())
            .with_paths(paths)
            .with_bytes(written))
    }
}
