//! Media downloader over HTTP(S), with inline `data:` URL support

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use mmagent_application::{InferenceError, MediaDownloader};
use reqwest::Client;
use tracing::debug;

pub struct HttpMediaDownloader {
    client: Client,
}

impl HttpMediaDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Decode a base64 `data:` URL.
fn decode_data_url(url: &str) -> Result<Vec<u8>, InferenceError> {
    let (meta, data) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| InferenceError::Protocol("malformed data URL".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(InferenceError::Protocol(
            "only base64 data URLs are supported".to_string(),
        ));
    }
    STANDARD
        .decode(data)
        .map_err(|e| InferenceError::Protocol(format!("invalid base64 in data URL: {}", e)))
}

#[async_trait]
impl MediaDownloader for HttpMediaDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, InferenceError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        debug!(url, "Downloading media");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Provider {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/img.png")
            .with_status(200)
            .with_body(vec![0x89u8, b'P', b'N', b'G'])
            .create_async()
            .await;

        let downloader = HttpMediaDownloader::new(Client::new());
        let bytes = downloader
            .download(&format!("{}/img.png", server.url()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/expired")
            .with_status(403)
            .with_body("expired")
            .create_async()
            .await;

        let downloader = HttpMediaDownloader::new(Client::new());
        let err = downloader
            .download(&format!("{}/expired", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Provider { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_data_url() {
        let downloader = HttpMediaDownloader::new(Client::new());
        let bytes = downloader
            .download("data:image/png;base64,aGVsbG8=")
            .await
            .unwrap();
        assert_eq!(bytes, b"hello");
        assert!(downloader.download("data:text/plain,hi").await.is_err());
    }
}
