//! HITL policy: which actions need a human, how urgently, and for how long.
//!
//! [`HitlPolicy`] captures the static rules consulted by the approval broker
//! before it suspends a tool. Rules are keyed by action type
//! (`"ai.text2image"`, `"artifacts.delete"`, ...). Actions without a rule
//! fall back to `default_require_approval` and the medium timeout.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Urgency of an approval; selects the timeout bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(DomainError::UnknownPriority(other.to_string())),
        }
    }
}

/// Per-action rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitlRule {
    pub action_type: String,
    pub enabled: bool,
    pub priority: Priority,
    pub require_approval: bool,
    /// Approve the original payload instead of failing when the wait times out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HitlRule {
    pub fn new(action_type: impl Into<String>, priority: Priority) -> Self {
        Self {
            action_type: action_type.into(),
            enabled: true,
            priority,
            require_approval: true,
            auto_approve_after_ms: None,
            description: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self.require_approval = false;
        self
    }

    pub fn with_auto_approve_after(mut self, after: Duration) -> Self {
        self.auto_approve_after_ms = Some(after.as_millis() as u64);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Wait budgets per priority, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTimeouts {
    pub high_ms: u64,
    pub medium_ms: u64,
    pub low_ms: u64,
}

impl Default for PriorityTimeouts {
    fn default() -> Self {
        Self {
            high_ms: 300_000,
            medium_ms: 120_000,
            low_ms: 60_000,
        }
    }
}

impl PriorityTimeouts {
    pub fn for_priority(&self, priority: Priority) -> Duration {
        Duration::from_millis(match priority {
            Priority::High => self.high_ms,
            Priority::Medium => self.medium_ms,
            Priority::Low => self.low_ms,
        })
    }
}

/// Policy decision for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitlAction {
    /// No approval needed; proceed with the payload untouched.
    PassThrough,
    /// Ask the external actor and wait up to `timeout`.
    RequestApproval {
        priority: Priority,
        timeout: Duration,
        auto_approve_on_timeout: bool,
    },
}

/// Human-in-the-loop policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitlPolicy {
    pub enabled: bool,
    pub default_require_approval: bool,
    pub rules: Vec<HitlRule>,
    pub timeouts: PriorityTimeouts,
}

impl Default for HitlPolicy {
    fn default() -> Self {
        let generation_grace = Duration::from_secs(30);
        Self {
            enabled: true,
            default_require_approval: false,
            rules: vec![
                HitlRule::new("file.delete", Priority::High),
                HitlRule::new("file.write", Priority::Low).disabled(),
                HitlRule::new("file.execute", Priority::High),
                HitlRule::new("network.http", Priority::Medium),
                HitlRule::new("network.websocket", Priority::Medium),
                HitlRule::new("system.command", Priority::High),
                HitlRule::new("system.package.install", Priority::High),
                HitlRule::new("data.export", Priority::High),
                HitlRule::new("data.delete_batch", Priority::High),
                HitlRule::new("ai.text2image", Priority::Low)
                    .with_auto_approve_after(generation_grace)
                    .with_description("Text-to-image generation"),
                HitlRule::new("ai.text2speech", Priority::Low)
                    .with_auto_approve_after(generation_grace)
                    .with_description("Speech synthesis"),
                HitlRule::new("ai.vl_script", Priority::Low)
                    .with_auto_approve_after(generation_grace)
                    .with_description("Script from image"),
                HitlRule::new("ai.image_edit", Priority::Low)
                    .with_auto_approve_after(generation_grace)
                    .with_description("Image editing"),
                HitlRule::new("artifacts.delete", Priority::High)
                    .with_description("Delete generated images or audio"),
            ],
            timeouts: PriorityTimeouts::default(),
        }
    }
}

impl HitlPolicy {
    /// A policy that never asks. Used for headless runs and tests.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_rule(mut self, rule: HitlRule) -> Self {
        self.rules.retain(|r| r.action_type != rule.action_type);
        self.rules.push(rule);
        self
    }

    pub fn with_timeouts(mut self, timeouts: PriorityTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_default_require_approval(mut self, require: bool) -> Self {
        self.default_require_approval = require;
        self
    }

    pub fn rule(&self, action_type: &str) -> Option<&HitlRule> {
        self.rules.iter().find(|r| r.action_type == action_type)
    }

    pub fn requires_approval(&self, action_type: &str) -> bool {
        if !self.enabled {
            return false;
        }
        match self.rule(action_type) {
            Some(rule) => rule.enabled && rule.require_approval,
            None => self.default_require_approval,
        }
    }

    pub fn timeout_for(&self, action_type: &str) -> Duration {
        let priority = self
            .rule(action_type)
            .map(|r| r.priority)
            .unwrap_or(Priority::Medium);
        self.timeouts.for_priority(priority)
    }

    /// Decide how the broker should treat `action_type`.
    pub fn evaluate(&self, action_type: &str) -> HitlAction {
        if !self.requires_approval(action_type) {
            return HitlAction::PassThrough;
        }
        let rule = self.rule(action_type);
        let priority = rule.map(|r| r.priority).unwrap_or_default();
        // With auto-approve configured, the grace period replaces the priority timeout.
        let (timeout, auto_approve_on_timeout) =
            match rule.and_then(|r| r.auto_approve_after_ms) {
                Some(ms) => (Duration::from_millis(ms), true),
                None => (self.timeouts.for_priority(priority), false),
            };
        HitlAction::RequestApproval {
            priority,
            timeout,
            auto_approve_on_timeout,
        }
    }
}
