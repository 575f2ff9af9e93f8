//! Approval policy overrides (`[hitl]` section)

use mmagent_domain::{HitlPolicy, HitlRule, PriorityTimeouts};
use serde::{Deserialize, Serialize};

/// Overrides applied on top of [`HitlPolicy::default`].
///
/// ```toml
/// [hitl]
/// enabled = true
///
/// [hitl.timeouts]
/// high_ms = 600000
/// medium_ms = 120000
/// low_ms = 30000
///
/// [[hitl.rules]]
/// action_type = "ai.text2image"
/// enabled = true
/// priority = "medium"
/// require_approval = true
/// ```
///
/// A rule replaces the built-in rule for the same `action_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHitlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_require_approval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<PriorityTimeouts>,
    pub rules: Vec<HitlRule>,
}

impl FileHitlConfig {
    pub fn to_policy(&self) -> HitlPolicy {
        let mut policy = if self.enabled == Some(false) {
            HitlPolicy::disabled()
        } else {
            HitlPolicy::default()
        };
        if let Some(require) = self.default_require_approval {
            policy = policy.with_default_require_approval(require);
        }
        if let Some(timeouts) = self.timeouts {
            policy = policy.with_timeouts(timeouts);
        }
        for rule in &self.rules {
            policy = policy.with_rule(rule.clone());
        }
        policy
    }
}
