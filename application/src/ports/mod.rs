pub mod approval;
pub mod artifact_store;
pub mod audit_logger;
pub mod inference;
pub mod line_ledger;
pub mod media;
pub mod tool_executor;
