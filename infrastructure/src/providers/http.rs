//! Shared HTTP plumbing for provider adapters
//!
//! Every adapter authenticates with a bearer key, sends JSON and maps
//! failures the same way: non-2xx becomes [`InferenceError::Provider`],
//! network failures become `Transport`, unparseable bodies become `Protocol`.

use mmagent_application::InferenceError;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

/// Join a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Authenticated JSON client for one provider.
#[derive(Clone)]
pub struct ProviderHttp {
    client: Client,
    api_key: String,
}

impl ProviderHttp {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// POST `body` and parse the JSON response.
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<Value, InferenceError> {
        let response = self.send_post(url, body, headers).await?;
        parse_json(response).await
    }

    /// POST `body` and return the raw response bytes.
    pub async fn post_for_bytes(&self, url: &str, body: &Value) -> Result<Vec<u8>, InferenceError> {
        let response = self.send_post(url, body, &[]).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    pub async fn get_json(&self, url: &str) -> Result<Value, InferenceError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;
        parse_json(check_status(response).await?).await
    }

    async fn send_post(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<Response, InferenceError> {
        debug!(url, "POST");
        let mut request = self.client.post(url).bearer_auth(&self.api_key).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await.map_err(transport)?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(InferenceError::Provider {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        body,
    })
}

async fn parse_json(response: Response) -> Result<Value, InferenceError> {
    let text = response.text().await.map_err(transport)?;
    serde_json::from_str(&text)
        .map_err(|e| InferenceError::Protocol(format!("response is not JSON: {}", e)))
}

fn transport(err: reqwest::Error) -> InferenceError {
    InferenceError::Transport(err.to_string())
}

/// String at a JSON pointer, if present and non-empty.
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://x/v1/", "chat/completions"),
            "https://x/v1/chat/completions"
        );
        assert_eq!(
            join_url("https://x/v1", "/chat/completions"),
            "https://x/v1/chat/completions"
        );
        assert_eq!(join_url("https://x/tasks//", "abc"), "https://x/tasks/abc");
    }

    #[test]
    fn test_str_at() {
        let value = json!({"output": {"task_id": "t-1", "empty": ""}});
        assert_eq!(str_at(&value, "/output/task_id"), Some("t-1"));
        assert_eq!(str_at(&value, "/output/empty"), None);
        assert_eq!(str_at(&value, "/output/missing"), None);
    }

    #[tokio::test]
    async fn test_non_success_maps_to_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/fail")
            .match_header("authorization", "Bearer sk-test")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let http = ProviderHttp::new(Client::new(), "sk-test");
        let err = http
            .post_json(&format!("{}/fail", server.url()), &json!({}), &[])
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(
            err,
            InferenceError::Provider {
                status: 429,
                status_text: "Too Many Requests".to_string(),
                body: "rate limited".to_string(),
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_non_json_body_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let http = ProviderHttp::new(Client::new(), "k");
        let err = http
            .get_json(&format!("{}/status", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let http = ProviderHttp::new(Client::new(), "k");
        let err = http.get_json("http://127.0.0.1:1/none").await.unwrap_err();
        assert!(matches!(err, InferenceError::Transport(_)));
    }
}
