//! Artifact storage adapters

mod fs_store;
mod line_ledger;

pub use fs_store::FsArtifactStore;
pub use line_ledger::{JsonLineLedger, LINE_RECORD_FILE};
