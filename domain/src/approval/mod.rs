//! Human-in-the-loop approval domain.
//!
//! - [`entities`]: request/response/outcome and the payload merge rule
//! - [`policy`]: which actions need approval and how long to wait

pub mod entities;
pub mod policy;
