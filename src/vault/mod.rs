//! Vault module — record storage.
//!
//! This module provides:
//! - `SecretRecord`, `OwnerId`, `RecordId` and `RecordSummary` types (`record`)
//! - Versioned JSON documents with atomic writes (`format`)
//! - The `RecordStore` seam and its file-backed implementation (`store`)
//! - An in-memory `RecordStore` (`memory`)

pub mod format;
pub mod memory;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use memory::MemoryRecordStore;
pub use record::{OwnerId, RecordId, RecordSummary, SecretRecord};
pub use store::{FileRecordStore, RecordStore, RECORDS_FILE};
