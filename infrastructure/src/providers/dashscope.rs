//! DashScope (Tongyi) native adapters: image generation, image editing and speech

use super::http::{ProviderHttp, join_url, str_at};
use async_trait::async_trait;
use mmagent_application::{AsyncPort, InferenceError, SyncPort, TaskPoller};
use mmagent_domain::{
    ImageEditInput, ImageGenInput, Provider, SpeechInput, SpeechOutput, TaskId, TaskStatus,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

const DEFAULT_VOICE: &str = "Cherry";
const T2I_MODEL: &str = "wan2.6-t2i";
const EDIT_MODEL: &str = "wan2.6-image";

/// Edit model paired with a text-to-image model. Other models edit as themselves.
pub fn dashscope_edit_model(t2i_model: &str) -> &str {
    if t2i_model == T2I_MODEL {
        EDIT_MODEL
    } else {
        t2i_model
    }
}

/// Map a generic voice alias to a DashScope voice. Unknown aliases get the default.
pub fn dashscope_voice(alias: &str) -> &'static str {
    match alias {
        "chinese_female" => "Cherry",
        "chinese_male" => "Ethan",
        "english_female" => "Serena",
        "english_male" => "Chelsie",
        _ => DEFAULT_VOICE,
    }
}

/// Text-to-image via the async multimodal-generation API.
pub struct DashScopeImagePort {
    http: ProviderHttp,
    endpoint: String,
    task_endpoint: String,
    model: String,
}

impl DashScopeImagePort {
    pub fn new(
        http: ProviderHttp,
        endpoint: impl Into<String>,
        task_endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            task_endpoint: task_endpoint.into(),
            model: model.into(),
        }
    }
}

fn first_image(response: &Value) -> Option<String> {
    response
        .pointer("/output/choices/0/message/content")
        .and_then(Value::as_array)?
        .iter()
        .find(|item| item.get("type").and_then(Value::as_str) == Some("image"))
        .and_then(|item| item.get("image"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl AsyncPort<ImageGenInput, String> for DashScopeImagePort {
    fn provider(&self) -> Provider {
        Provider::DashScope
    }

    async fn submit(&self, input: &ImageGenInput) -> Result<TaskId, InferenceError> {
        let body = json!({
            "model": self.model,
            "input": {
                "messages": [{
                    "role": "user",
                    "content": [{"text": input.prompt}],
                }],
            },
            "parameters": input.parameters,
        });
        submit_task(&self.http, &self.endpoint, &body).await
    }

    async fn poll(&self, task_id: &TaskId) -> Result<TaskStatus<String>, InferenceError> {
        poll_image_task(&self.http, &self.task_endpoint, task_id).await
    }
}

async fn submit_task(
    http: &ProviderHttp,
    endpoint: &str,
    body: &Value,
) -> Result<TaskId, InferenceError> {
    let response = http
        .post_json(endpoint, body, &[("X-DashScope-Async", "enable")])
        .await?;
    str_at(&response, "/output/task_id")
        .map(TaskId::new)
        .ok_or_else(|| InferenceError::Protocol("submit response has no output.task_id".to_string()))
}

async fn poll_image_task(
    http: &ProviderHttp,
    task_endpoint: &str,
    task_id: &TaskId,
) -> Result<TaskStatus<String>, InferenceError> {
    let url = join_url(task_endpoint, task_id.as_str());
    let response = http.get_json(&url).await?;
    let status = match str_at(&response, "/output/task_status") {
        Some("FAILED") => TaskStatus::Failed(
            str_at(&response, "/output/message")
                .unwrap_or("Unknown error")
                .to_string(),
        ),
        Some("SUCCEEDED") => TaskStatus::Succeeded(first_image(&response)),
        _ => TaskStatus::Pending,
    };
    Ok(status)
}

/// Image editing with reference images.
///
/// The vendor API is submit-then-poll like generation; this port drives the
/// poll loop itself and answers with the edited image URL.
pub struct DashScopeImageEditPort {
    http: ProviderHttp,
    endpoint: String,
    task_endpoint: String,
    model: String,
    poller: TaskPoller,
}

impl DashScopeImageEditPort {
    pub fn new(
        http: ProviderHttp,
        endpoint: impl Into<String>,
        task_endpoint: impl Into<String>,
        model: impl Into<String>,
        poller: TaskPoller,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            task_endpoint: task_endpoint.into(),
            model: model.into(),
            poller,
        }
    }
}

#[async_trait]
impl AsyncPort<ImageEditInput, String> for DashScopeImageEditPort {
    fn provider(&self) -> Provider {
        Provider::DashScope
    }

    async fn submit(&self, input: &ImageEditInput) -> Result<TaskId, InferenceError> {
        let model = input
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.model);
        let content: Vec<Value> = std::iter::once(json!({"text": input.prompt}))
            .chain(input.images.iter().map(|image| json!({"image": image})))
            .collect();
        let body = json!({
            "model": model,
            "input": {
                "messages": [{"role": "user", "content": content}],
            },
            "parameters": input.parameters,
        });
        submit_task(&self.http, &self.endpoint, &body).await
    }

    async fn poll(&self, task_id: &TaskId) -> Result<TaskStatus<String>, InferenceError> {
        poll_image_task(&self.http, &self.task_endpoint, task_id).await
    }
}

#[async_trait]
impl SyncPort<ImageEditInput, String> for DashScopeImageEditPort {
    fn provider(&self) -> Provider {
        Provider::DashScope
    }

    /// Callers cancel by dropping this future.
    async fn execute(&self, input: &ImageEditInput) -> Result<String, InferenceError> {
        let tasks: &dyn AsyncPort<ImageEditInput, String> = self;
        self.poller.run(tasks, input, &CancellationToken::new()).await
    }
}

/// Speech synthesis. The API answers with a URL to the rendered audio.
pub struct DashScopeSpeechPort {
    http: ProviderHttp,
    endpoint: String,
    model: String,
}

impl DashScopeSpeechPort {
    pub fn new(http: ProviderHttp, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl SyncPort<SpeechInput, SpeechOutput> for DashScopeSpeechPort {
    fn provider(&self) -> Provider {
        Provider::DashScope
    }

    async fn execute(&self, input: &SpeechInput) -> Result<SpeechOutput, InferenceError> {
        let body = json!({
            "model": self.model,
            "input": {
                "text": input.text,
                "voice": dashscope_voice(&input.voice),
                "language_type": "Chinese",
            },
        });
        let response = self.http.post_json(&self.endpoint, &body, &[]).await?;
        str_at(&response, "/output/audio/url")
            .map(|url| SpeechOutput::AudioUrl(url.to_string()))
            .ok_or_else(|| InferenceError::Protocol("response has no output.audio.url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmagent_application::PollerConfig;
    use mockito::Matcher;
    use reqwest::Client;
    use std::time::Duration;

    fn http() -> ProviderHttp {
        ProviderHttp::new(Client::new(), "sk-ds")
    }

    fn image_port(server: &mockito::Server) -> DashScopeImagePort {
        DashScopeImagePort::new(
            http(),
            format!("{}/generation", server.url()),
            format!("{}/tasks/", server.url()),
            "wan2.6-t2i",
        )
    }

    #[test]
    fn test_voice_aliases() {
        assert_eq!(dashscope_voice("chinese_male"), "Ethan");
        assert_eq!(dashscope_voice("english_female"), "Serena");
        assert_eq!(dashscope_voice("english_male"), "Chelsie");
        assert_eq!(dashscope_voice("robot"), "Cherry");
    }

    #[tokio::test]
    async fn test_submit_sends_async_header_and_reads_task_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generation")
            .match_header("x-dashscope-async", "enable")
            .match_header("authorization", "Bearer sk-ds")
            .match_body(Matcher::PartialJson(json!({
                "model": "wan2.6-t2i",
                "input": {"messages": [{"role": "user", "content": [{"text": "a cat"}]}]},
                "parameters": {"size": "1280*1280"},
            })))
            .with_status(200)
            .with_body(r#"{"output":{"task_id":"task-42","task_status":"PENDING"}}"#)
            .create_async()
            .await;

        let input = ImageGenInput::new("a cat").with_parameter("size", "1280*1280");
        let id = image_port(&server).submit(&input).await.unwrap();
        assert_eq!(id.as_str(), "task-42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_without_task_id_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generation")
            .with_status(200)
            .with_body(r#"{"output":{}}"#)
            .create_async()
            .await;

        let err = image_port(&server)
            .submit(&ImageGenInput::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_poll_classifies_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tasks/running")
            .with_status(200)
            .with_body(r#"{"output":{"task_status":"RUNNING"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tasks/failed")
            .with_status(200)
            .with_body(r#"{"output":{"task_status":"FAILED","message":"content blocked"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tasks/done")
            .with_status(200)
            .with_body(
                r#"{"output":{"task_status":"SUCCEEDED","choices":[{"message":{"content":[
                    {"type":"text","text":"ok"},
                    {"type":"image","image":"https://cdn/img.png"}
                ]}}]}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/tasks/empty")
            .with_status(200)
            .with_body(r#"{"output":{"task_status":"SUCCEEDED","choices":[]}}"#)
            .create_async()
            .await;

        let port = image_port(&server);
        assert_eq!(
            port.poll(&TaskId::new("running")).await.unwrap(),
            TaskStatus::Pending
        );
        assert_eq!(
            port.poll(&TaskId::new("failed")).await.unwrap(),
            TaskStatus::Failed("content blocked".to_string())
        );
        assert_eq!(
            port.poll(&TaskId::new("done")).await.unwrap(),
            TaskStatus::Succeeded(Some("https://cdn/img.png".to_string()))
        );
        assert_eq!(
            port.poll(&TaskId::new("empty")).await.unwrap(),
            TaskStatus::Succeeded(None)
        );
    }

    #[test]
    fn test_edit_model_pairing() {
        assert_eq!(dashscope_edit_model("wan2.6-t2i"), "wan2.6-image");
        assert_eq!(dashscope_edit_model("qwen-image-edit"), "qwen-image-edit");
    }

    fn edit_port(server: &mockito::Server) -> DashScopeImageEditPort {
        DashScopeImageEditPort::new(
            http(),
            format!("{}/generation", server.url()),
            format!("{}/tasks", server.url()),
            "wan2.6-image",
            TaskPoller::new(
                PollerConfig::default()
                    .with_interval(Duration::from_millis(1))
                    .with_max_attempts(3),
            ),
        )
    }

    #[tokio::test]
    async fn test_edit_submits_images_and_polls_to_url() {
        let mut server = mockito::Server::new_async().await;
        let submit = server
            .mock("POST", "/generation")
            .match_header("x-dashscope-async", "enable")
            .match_body(Matcher::PartialJson(json!({
                "model": "wan2.6-image",
                "input": {"messages": [{"role": "user", "content": [
                    {"text": "make it night"},
                    {"image": "data:image/png;base64,AAAA"},
                    {"image": "data:image/png;base64,BBBB"},
                ]}]},
                "parameters": {"n": 1, "watermark": false},
            })))
            .with_status(200)
            .with_body(r#"{"output":{"task_id":"edit-1","task_status":"PENDING"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tasks/edit-1")
            .with_status(200)
            .with_body(
                r#"{"output":{"task_status":"SUCCEEDED","choices":[{"message":{"content":[
                    {"type":"image","image":"https://cdn/edited.png"}
                ]}}]}}"#,
            )
            .create_async()
            .await;

        let input = ImageEditInput::new(
            "make it night",
            vec![
                "data:image/png;base64,AAAA".to_string(),
                "data:image/png;base64,BBBB".to_string(),
            ],
        )
        .with_parameter("n", 1)
        .with_parameter("watermark", false);
        let url = edit_port(&server).execute(&input).await.unwrap();

        assert_eq!(url, "https://cdn/edited.png");
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_model_override_and_task_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generation")
            .match_body(Matcher::PartialJson(json!({"model": "custom-edit"})))
            .with_status(200)
            .with_body(r#"{"output":{"task_id":"edit-2"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tasks/edit-2")
            .with_status(200)
            .with_body(r#"{"output":{"task_status":"FAILED","message":"bad image"}}"#)
            .create_async()
            .await;

        let input = ImageEditInput::new("x", vec!["data:image/png;base64,AA".to_string()])
            .with_model("custom-edit");
        let err = edit_port(&server).execute(&input).await.unwrap_err();
        assert_eq!(err, InferenceError::TaskFailed("bad image".to_string()));
    }

    #[tokio::test]
    async fn test_edit_rejected_by_provider() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generation")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let input = ImageEditInput::new("x", vec!["data:image/png;base64,AA".to_string()]);
        let err = edit_port(&server).execute(&input).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_speech_returns_audio_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tts")
            .match_body(Matcher::PartialJson(json!({
                "model": "qwen-tts",
                "input": {"text": "你好", "voice": "Ethan"},
            })))
            .with_status(200)
            .with_body(r#"{"output":{"audio":{"url":"https://cdn/a.wav"}}}"#)
            .create_async()
            .await;

        let port = DashScopeSpeechPort::new(http(), format!("{}/tts", server.url()), "qwen-tts");
        let input = SpeechInput {
            text: "你好".to_string(),
            voice: "chinese_male".to_string(),
        };
        assert_eq!(
            port.execute(&input).await.unwrap(),
            SpeechOutput::AudioUrl("https://cdn/a.wav".to_string())
        );
        mock.assert_async().await;
    }
}
