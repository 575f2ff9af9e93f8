//! Tool toggles (`[tools]` section)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-tool enable switch. Tools not listed are enabled.
///
/// ```toml
/// [tools]
/// describe_image = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileToolsConfig {
    pub enabled: HashMap<String, bool>,
}

impl FileToolsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.get(name).copied().unwrap_or(true)
    }
}
