//! Inference domain: capabilities, providers and the values that cross ports.

pub mod capability;
pub mod io;
pub mod task;
