//! Logging infrastructure: the JSONL audit trail.
//!
//! [`JsonlAuditLogger`] implements the [`AuditLogger`](mmagent_application::AuditLogger)
//! port.

mod jsonl_logger;

pub use jsonl_logger::JsonlAuditLogger;
