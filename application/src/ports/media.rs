//! Media download port
//!
//! Providers often return a URL instead of bytes; tools fetch those through
//! this port before writing them to the artifact store.

use super::inference::InferenceError;
use async_trait::async_trait;

#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Fetch `url` and return the body.
    async fn download(&self, url: &str) -> Result<Vec<u8>, InferenceError>;
}
