//! Console responder for approval requests.
//!
//! Reads requests pushed by the approval channel, shows them on the terminal
//! and answers through the broker:
//!
//! ```text
//! ── Approval required: ai.text2image (low, 30s) ──
//! {
//!   "prompt": "a fox reading under a lamp"
//! }
//!
//! approve> edit {"prompt": "a fox reading under a candle"}
//! ```
//!
//! # Commands
//!
//! | Command | Aliases | Description |
//! |---------|---------|-------------|
//! | `/approve` | `approve`, `a`, `y` | Approve the payload as shown |
//! | `/reject [reason]` | `reject`, `r`, `n` | Deny, optionally with a note |
//! | `/edit <json>` | `edit`, `e` | Approve with fields replaced by the JSON object |

use colored::Colorize;
use mmagent_application::ApprovalBroker;
use mmagent_domain::{ApprovalRequest, ApprovalResponse, Payload};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// What the user typed, once understood.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleDecision {
    Approve,
    Reject(Option<String>),
    Edit(Payload),
}

impl ConsoleDecision {
    pub fn into_response(self) -> ApprovalResponse {
        match self {
            ConsoleDecision::Approve => ApprovalResponse::approve(),
            ConsoleDecision::Reject(reason) => ApprovalResponse::deny(reason),
            ConsoleDecision::Edit(payload) => ApprovalResponse::approve_with_edits(payload),
        }
    }
}

/// Parse one input line. `Ok(None)` for an empty line.
pub fn parse_decision(input: &str) -> Result<Option<ConsoleDecision>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    match command.to_lowercase().as_str() {
        "/approve" | "approve" | "a" | "y" | "yes" => Ok(Some(ConsoleDecision::Approve)),
        "/reject" | "reject" | "r" | "n" | "no" => {
            let reason = (!rest.is_empty()).then(|| rest.to_string());
            Ok(Some(ConsoleDecision::Reject(reason)))
        }
        "/edit" | "edit" | "e" => {
            if rest.is_empty() {
                return Err("Usage: /edit {\"field\": \"new value\"}".to_string());
            }
            match serde_json::from_str::<serde_json::Value>(rest) {
                Ok(serde_json::Value::Object(payload)) => Ok(Some(ConsoleDecision::Edit(payload))),
                Ok(_) => Err("Edits must be a JSON object".to_string()),
                Err(e) => Err(format!("Invalid JSON: {}", e)),
            }
        }
        _ => Err(format!("Unknown command: {}", command)),
    }
}

/// Answers approval requests from the terminal.
pub struct ConsoleApprover {
    broker: Arc<ApprovalBroker>,
    auto_approve: bool,
}

impl ConsoleApprover {
    pub fn new(broker: Arc<ApprovalBroker>) -> Self {
        Self {
            broker,
            auto_approve: false,
        }
    }

    /// Approve everything without prompting (`--yes`).
    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    /// Serve requests until the channel closes.
    pub async fn run(self, mut requests: UnboundedReceiver<ApprovalRequest>) {
        while let Some(request) = requests.recv().await {
            let response = if self.auto_approve {
                println!(
                    "{} {}",
                    "Auto-approved:".dimmed(),
                    request.action_type.dimmed()
                );
                ApprovalResponse::approve()
            } else {
                display_request(&request);
                self.ask().await
            };

            if !self.broker.respond(&request.request_id, response) {
                println!(
                    "{}",
                    "Request was already resolved (timed out or cancelled).".yellow()
                );
            }
        }
    }

    async fn ask(&self) -> ApprovalResponse {
        loop {
            let line = match read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    println!();
                    return ApprovalResponse::deny(Some("No input available".to_string()));
                }
                Err(e) => {
                    println!("{} {}", "Failed to read input:".red(), e);
                    return ApprovalResponse::deny(Some("Console error".to_string()));
                }
            };

            match parse_decision(&line) {
                Ok(Some(decision)) => {
                    match &decision {
                        ConsoleDecision::Approve => println!("{}", "✓ Approved".green()),
                        ConsoleDecision::Edit(_) => println!("{}", "✓ Approved with edits".green()),
                        ConsoleDecision::Reject(_) => println!("{}", "✗ Rejected".red()),
                    }
                    return decision.into_response();
                }
                Ok(None) => continue,
                Err(message) => {
                    println!("{} {}", "⚠️".yellow(), message.red());
                    println!("Available commands: /approve, /reject [reason], /edit <json>");
                }
            }
        }
    }
}

fn display_request(request: &ApprovalRequest) {
    println!();
    println!(
        "{}",
        format!(
            "── Approval required: {} ({}, {}s) ──",
            request.action_type,
            request.priority,
            request.timeout_ms / 1000
        )
        .yellow()
        .bold()
    );
    if let Some(thread_id) = &request.thread_id {
        println!("{} {}", "Run:".cyan().bold(), thread_id.dimmed());
    }
    let payload = serde_json::to_string_pretty(&request.payload)
        .unwrap_or_else(|_| format!("{:?}", request.payload));
    println!("{}", payload);
    println!();
}

/// One line from stdin; `None` at end of input.
async fn read_line() -> io::Result<Option<String>> {
    print!("{} ", "approve>".magenta().bold());
    io::stdout().flush()?;

    tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        match io::stdin().read_line(&mut input)? {
            0 => Ok(None),
            _ => Ok(Some(input)),
        }
    })
    .await
    .map_err(io::Error::other)?
}
