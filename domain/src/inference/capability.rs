//! Capability and provider value objects.
//!
//! A [`Capability`] decides the *shape* of a port (sync `execute` or async
//! `submit`/`poll`); a [`Provider`] decides which vendor adapter sits behind
//! it. Whether a `(capability, provider)` pair exists at all is answered
//! here, once, so that unsupported wiring fails before any request is made.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// What an inference port can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Image + prompt in, text out.
    Vision,
    /// Prompt in, image URL out (long-running, submit then poll).
    TextToImage,
    /// Text in, audio out.
    TextToSpeech,
    /// Chat completion.
    Text,
}

/// Interaction shape a port exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// One round trip per call: `execute`.
    Sync,
    /// `submit` returns a task id, `poll` checks it.
    Async,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Vision,
        Capability::TextToImage,
        Capability::TextToSpeech,
        Capability::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Vision => "vision",
            Capability::TextToImage => "text_to_image",
            Capability::TextToSpeech => "text_to_speech",
            Capability::Text => "text",
        }
    }

    /// Port protocol used for this capability.
    pub fn protocol(&self) -> Protocol {
        match self {
            Capability::TextToImage => Protocol::Async,
            Capability::Vision | Capability::TextToSpeech | Capability::Text => Protocol::Sync,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vision" | "vl" => Ok(Capability::Vision),
            "text_to_image" | "t2i" => Ok(Capability::TextToImage),
            "text_to_speech" | "tts" => Ok(Capability::TextToSpeech),
            "text" | "llm" => Ok(Capability::Text),
            other => Err(DomainError::UnknownCapability(other.to_string())),
        }
    }
}

/// External AI vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    DashScope,
    Zhipu,
    /// Any vendor speaking the OpenAI `chat/completions` dialect.
    #[serde(rename = "openai")]
    OpenAiCompatible,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::DashScope => "dashscope",
            Provider::Zhipu => "zhipu",
            Provider::OpenAiCompatible => "openai",
        }
    }

    /// Whether this vendor has an adapter for `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        match self {
            Provider::DashScope | Provider::Zhipu => true,
            Provider::OpenAiCompatible => {
                matches!(capability, Capability::Text | Capability::Vision)
            }
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashscope" | "tongyi" => Ok(Provider::DashScope),
            "zhipu" | "glm" => Ok(Provider::Zhipu),
            "openai" | "openai_compatible" => Ok(Provider::OpenAiCompatible),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_protocol() {
        assert_eq!(Capability::TextToImage.protocol(), Protocol::Async);
        assert_eq!(Capability::Vision.protocol(), Protocol::Sync);
        assert_eq!(Capability::TextToSpeech.protocol(), Protocol::Sync);
        assert_eq!(Capability::Text.protocol(), Protocol::Sync);
    }

    #[test]
    fn test_capability_parse_aliases() {
        assert_eq!("t2i".parse::<Capability>().unwrap(), Capability::TextToImage);
        assert_eq!("TTS".parse::<Capability>().unwrap(), Capability::TextToSpeech);
        assert_eq!("vl".parse::<Capability>().unwrap(), Capability::Vision);
        assert!("video".parse::<Capability>().is_err());
    }

    #[test]
    fn test_provider_roundtrip() {
        for provider in [Provider::DashScope, Provider::Zhipu, Provider::OpenAiCompatible] {
            let parsed: Provider = provider.to_string().parse().unwrap();
            assert_eq!(parsed, provider);
        }
    }

    #[test]
    fn test_provider_unknown() {
        let err = "acme".parse::<Provider>().unwrap_err();
        assert_eq!(err, DomainError::UnknownProvider("acme".to_string()));
    }

    #[test]
    fn test_provider_support_matrix() {
        for capability in Capability::ALL {
            assert!(Provider::DashScope.supports(capability));
            assert!(Provider::Zhipu.supports(capability));
        }
        assert!(Provider::OpenAiCompatible.supports(Capability::Text));
        assert!(Provider::OpenAiCompatible.supports(Capability::Vision));
        assert!(!Provider::OpenAiCompatible.supports(Capability::TextToImage));
        assert!(!Provider::OpenAiCompatible.supports(Capability::TextToSpeech));
    }

    #[test]
    fn test_provider_serde() {
        let json = serde_json::to_string(&Provider::OpenAiCompatible).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: Provider = serde_json::from_str("\"zhipu\"").unwrap();
        assert_eq!(parsed, Provider::Zhipu);
    }
}
