//! Chat-completions adapters (text and vision)
//!
//! DashScope's compatible mode, Zhipu and OpenAI all accept the same
//! `POST <base>/chat/completions` shape, so one pair of adapters serves them.

use super::http::{ProviderHttp, join_url, str_at};
use async_trait::async_trait;
use mmagent_application::{InferenceError, SyncPort};
use mmagent_domain::{Provider, TextInput, VisionInput};
use serde_json::{Value, json};

const CHAT_PATH: &str = "chat/completions";

fn message_content(response: &Value) -> Result<String, InferenceError> {
    str_at(response, "/choices/0/message/content")
        .map(str::to_string)
        .ok_or_else(|| InferenceError::Protocol("response has no message content".to_string()))
}

/// Plain chat completion.
pub struct ChatTextPort {
    provider: Provider,
    http: ProviderHttp,
    url: String,
    model: String,
}

impl ChatTextPort {
    pub fn new(provider: Provider, http: ProviderHttp, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            provider,
            http,
            url: join_url(base_url, CHAT_PATH),
            model: model.into(),
        }
    }
}

#[async_trait]
impl SyncPort<TextInput, String> for ChatTextPort {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn execute(&self, input: &TextInput) -> Result<String, InferenceError> {
        let mut body = json!({
            "model": self.model,
            "messages": input.messages,
        });
        if let Some(temperature) = input.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = input.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        let response = self.http.post_json(&self.url, &body, &[]).await?;
        message_content(&response)
    }
}

/// Image (as a data URL) plus an instruction, answered as text.
pub struct ChatVisionPort {
    provider: Provider,
    http: ProviderHttp,
    url: String,
    model: String,
}

impl ChatVisionPort {
    pub fn new(provider: Provider, http: ProviderHttp, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            provider,
            http,
            url: join_url(base_url, CHAT_PATH),
            model: model.into(),
        }
    }
}

#[async_trait]
impl SyncPort<VisionInput, String> for ChatVisionPort {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn execute(&self, input: &VisionInput) -> Result<String, InferenceError> {
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "image_url", "image_url": {"url": input.data_url}},
                    {"type": "text", "text": input.prompt},
                ],
            }],
        });
        let response = self.http.post_json(&self.url, &body, &[]).await?;
        message_content(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::Client;

    fn http() -> ProviderHttp {
        ProviderHttp::new(Client::new(), "sk-test")
    }

    #[tokio::test]
    async fn test_text_completion_with_trailing_slash_base() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "glm-4.5",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
            .create_async()
            .await;

        let base = format!("{}/v1/", server.url());
        let port = ChatTextPort::new(Provider::Zhipu, http(), &base, "glm-4.5");
        let mut input = TextInput::prompt("hi");
        input.temperature = Some(0.5);

        let out = port.execute(&input).await.unwrap();
        assert_eq!(out, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_vision_sends_image_part_first() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "qwen3-vl-plus",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}},
                        {"type": "text", "text": "describe"},
                    ],
                }],
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"[{\"text\":\"hi\"}]"}}]}"#)
            .create_async()
            .await;

        let port = ChatVisionPort::new(Provider::DashScope, http(), &server.url(), "qwen3-vl-plus");
        let input = VisionInput {
            data_url: "data:image/png;base64,AAAA".to_string(),
            prompt: "describe".to_string(),
        };
        assert_eq!(port.execute(&input).await.unwrap(), r#"[{"text":"hi"}]"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_content_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let port = ChatTextPort::new(Provider::OpenAiCompatible, http(), &server.url(), "m");
        let err = port.execute(&TextInput::prompt("x")).await.unwrap_err();
        assert!(matches!(err, InferenceError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let port = ChatTextPort::new(Provider::DashScope, http(), &server.url(), "m");
        match port.execute(&TextInput::prompt("x")).await.unwrap_err() {
            InferenceError::Provider { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
