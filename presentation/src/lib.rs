//! Presentation layer for mmagent
//!
//! This crate contains CLI definitions, the console approval responder,
//! output formatters and progress reporters.

pub mod approval;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use approval::console::{ConsoleApprover, ConsoleDecision, parse_decision};
pub use cli::commands::{CategoryArg, Cli, Command, ProviderArg};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
