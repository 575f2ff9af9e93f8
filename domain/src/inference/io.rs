//! Port input and output types.
//!
//! These are vendor-neutral: adapters translate them into each provider's
//! request body and back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input for a vision (image understanding) call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionInput {
    /// `data:<mime>;base64,...` URL or a public image URL.
    pub data_url: String,
    pub prompt: String,
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Input for a plain chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInput {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl TextInput {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Input for text-to-image generation.
///
/// `parameters` is passed through to the vendor after adapter-specific
/// normalization (e.g. Zhipu wants `1024x1024`, DashScope `1024*1024`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageGenInput {
    pub prompt: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ImageGenInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }
}

/// Input for image editing: a prompt plus one or more reference images.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageEditInput {
    pub prompt: String,
    /// `data:<mime>;base64,...` URLs, in the order the prompt refers to them.
    pub images: Vec<String>,
    /// Overrides the adapter's edit model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ImageEditInput {
    pub fn new(prompt: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            images,
            model: None,
            parameters: Map::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Input for speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechInput {
    pub text: String,
    /// Logical voice name (`chinese_female`, ...) or a vendor voice id.
    pub voice: String,
}

/// Speech synthesis result. Vendors either host the audio or stream it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutput {
    /// Audio hosted by the vendor; the caller downloads it.
    AudioUrl(String),
    /// Raw signed 16-bit little-endian PCM.
    Pcm {
        bytes: Vec<u8>,
        sample_rate: u32,
        channels: u16,
    },
}
