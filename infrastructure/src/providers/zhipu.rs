//! Zhipu (BigModel) native adapters: image generation and speech

use super::http::{ProviderHttp, join_url, str_at};
use async_trait::async_trait;
use mmagent_application::{AsyncPort, InferenceError, SyncPort};
use mmagent_domain::{ImageGenInput, Provider, SpeechInput, SpeechOutput, TaskId, TaskStatus};
use serde_json::json;

/// Zhipu speech output format: raw little-endian 16-bit PCM.
pub const PCM_SAMPLE_RATE: u32 = 24_000;
pub const PCM_CHANNELS: u16 = 1;

const DEFAULT_SIZE: &str = "1280x1280";
const DEFAULT_QUALITY: &str = "hd";

/// Every alias maps to `tongtong`, the only voice the endpoint ships with.
pub fn zhipu_voice(_alias: &str) -> &'static str {
    "tongtong"
}

/// Text-to-image via the async images API.
pub struct ZhipuImagePort {
    http: ProviderHttp,
    endpoint: String,
    task_endpoint: String,
    model: String,
}

impl ZhipuImagePort {
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

#[async_trait]
impl AsyncPort<ImageGenInput, String> for ZhipuImagePort {
    fn provider(&self) -> Provider {
        Provider::Zhipu
    }

    async fn submit(&self, input: &ImageGenInput) -> Result<TaskId, InferenceError> {
        // DashScope-style "W*H" sizes are accepted too.
        let size = input
            .parameter_str("size")
            .unwrap_or(DEFAULT_SIZE)
            .replace('*', "x");
        let mut body = json!({
            "model": self.model,
            "prompt": input.prompt,
            "size": size,
            "quality": input.parameter_str("quality").unwrap_or(DEFAULT_QUALITY),
            "watermark_enabled": true,
        });
        if let Some(negative) = input
            .parameter_str("negative_prompt")
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            body["negative_prompt"] = json!(negative);
        }

        let response = self.http.post_json(&self.endpoint, &body, &[]).await?;
        str_at(&response, "/id")
            .map(TaskId::new)
            .ok_or_else(|| InferenceError::Protocol("submit response has no id".to_string()))
    }

    async fn poll(&self, task_id: &TaskId) -> Result<TaskStatus<String>, InferenceError> {
        let url = join_url(&self.task_endpoint, task_id.as_str());
        let response = self.http.get_json(&url).await?;

        if str_at(&response, "/task_status") == Some("FAIL") {
            let message = str_at(&response, "/error/message").unwrap_or("Unknown error");
            return Ok(TaskStatus::Failed(message.to_string()));
        }
        if let Some(image) = str_at(&response, "/image_result/0/url") {
            return Ok(TaskStatus::Succeeded(Some(image.to_string())));
        }
        if str_at(&response, "/task_status") == Some("SUCCESS") {
            return Ok(TaskStatus::Succeeded(None));
        }
        Ok(TaskStatus::Pending)
    }
}

/// Speech synthesis returning raw PCM.
pub struct ZhipuSpeechPort {
    http: ProviderHttp,
    endpoint: String,
    model: String,
}

impl ZhipuSpeechPort {
    pub fn new(http: ProviderHttp, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl SyncPort<SpeechInput, SpeechOutput> for ZhipuSpeechPort {
    fn provider(&self) -> Provider {
        Provider::Zhipu
    }

    async fn execute(&self, input: &SpeechInput) -> Result<SpeechOutput, InferenceError> {
        let body = json!({
            "model": self.model,
            "input": input.text,
            "voice": zhipu_voice(&input.voice),
            "response_format": "pcm",
        });
        let bytes = self.http.post_for_bytes(&self.endpoint, &body).await?;
        if bytes.is_empty() {
            return Err(InferenceError::Protocol("empty audio response".to_string()));
        }
        Ok(SpeechOutput::Pcm {
            bytes,
            sample_rate: PCM_SAMPLE_RATE,
            channels: PCM_CHANNELS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::Client;

    fn http() -> ProviderHttp {
        ProviderHttp::new(Client::new(), "zk")
    }

    fn image_port(server: &mockito::Server) -> ZhipuImagePort {
        ZhipuImagePort::new(
            http(),
            format!("{}/async/images/generations", server.url()),
            format!("{}/async/tasks", server.url()),
            "glm-image",
        )
    }

    #[tokio::test]
    async fn test_submit_normalizes_size_and_trims_negative_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/async/images/generations")
            .match_body(Matcher::Json(json!({
                "model": "glm-image",
                "prompt": "a cat",
                "size": "1024x1024",
                "quality": "hd",
                "watermark_enabled": true,
                "negative_prompt": "blurry",
            })))
            .with_status(200)
            .with_body(r#"{"id":"z-1","task_status":"PROCESSING"}"#)
            .create_async()
            .await;

        let input = ImageGenInput::new("a cat")
            .with_parameter("size", "1024*1024")
            .with_parameter("negative_prompt", "  blurry ");
        let id = image_port(&server).submit(&input).await.unwrap();
        assert_eq!(id.as_str(), "z-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_omits_blank_negative_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/async/images/generations")
            .match_body(Matcher::Json(json!({
                "model": "glm-image",
                "prompt": "p",
                "size": "1280x1280",
                "quality": "hd",
                "watermark_enabled": true,
            })))
            .with_status(200)
            .with_body(r#"{"id":"z-2"}"#)
            .create_async()
            .await;

        let input = ImageGenInput::new("p").with_parameter("negative_prompt", "   ");
        image_port(&server).submit(&input).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_poll_classifies_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/async/tasks/a")
            .with_status(200)
            .with_body(r#"{"task_status":"PROCESSING"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/async/tasks/b")
            .with_status(200)
            .with_body(r#"{"task_status":"FAIL","error":{"message":"sensitive"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/async/tasks/c")
            .with_status(200)
            .with_body(r#"{"task_status":"SUCCESS","image_result":[{"url":"https://cdn/z.png"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/async/tasks/d")
            .with_status(200)
            .with_body(r#"{"task_status":"FAIL"}"#)
            .create_async()
            .await;

        let port = image_port(&server);
        assert_eq!(port.poll(&TaskId::new("a")).await.unwrap(), TaskStatus::Pending);
        assert_eq!(
            port.poll(&TaskId::new("b")).await.unwrap(),
            TaskStatus::Failed("sensitive".to_string())
        );
        assert_eq!(
            port.poll(&TaskId::new("c")).await.unwrap(),
            TaskStatus::Succeeded(Some("https://cdn/z.png".to_string()))
        );
        assert_eq!(
            port.poll(&TaskId::new("d")).await.unwrap(),
            TaskStatus::Failed("Unknown error".to_string())
        );
    }

    #[tokio::test]
    async fn test_speech_returns_pcm() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/speech")
            .match_body(Matcher::PartialJson(json!({
                "model": "glm-tts",
                "input": "hello",
                "voice": "tongtong",
                "response_format": "pcm",
            })))
            .with_status(200)
            .with_body(vec![1u8, 0, 2, 0])
            .create_async()
            .await;

        let port = ZhipuSpeechPort::new(http(), format!("{}/audio/speech", server.url()), "glm-tts");
        let input = SpeechInput {
            text: "hello".to_string(),
            voice: "chinese_male".to_string(),
        };
        assert_eq!(
            port.execute(&input).await.unwrap(),
            SpeechOutput::Pcm {
                bytes: vec![1, 0, 2, 0],
                sample_rate: 24_000,
                channels: 1,
            }
        );
        mock.assert_async().await;
    }
}
