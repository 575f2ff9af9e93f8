//! Inference provider adapters and the port factory

mod chat;
mod dashscope;
mod factory;
mod http;
mod settings;
mod zhipu;

pub use chat::{ChatTextPort, ChatVisionPort};
pub use dashscope::{
    DashScopeImageEditPort, DashScopeImagePort, DashScopeSpeechPort, dashscope_edit_model,
    dashscope_voice,
};
pub use factory::PortFactory;
pub use http::{ProviderHttp, join_url};
pub use settings::{CapabilitySettings, ProviderSettings};
pub use zhipu::{ZhipuImagePort, ZhipuSpeechPort, zhipu_voice};
