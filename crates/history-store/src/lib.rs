//! Execution history and extracted-data store.
//!
//! One store is shared by every case in a process. Records are append-only;
//! `clear` is the only way to drop them.

pub mod errors;
pub mod key;
pub mod model;
pub mod sink;
pub mod store;

pub use errors::StoreError;
pub use key::generate_storage_key;
pub use model::{
    ArtifactMetadata, ExecutionOutcome, ExecutionRecord, ExportBundle, ExtractedArtifact,
    ExtractedSummary, HistoryStats, RecentStep, STORE_SCHEMA_VERSION,
};
pub use sink::{ArtifactSink, FsArtifactSink};
pub use store::HistoryStore;
