//! Persistence for segment groups.
//!
//! Backends implement [`SegmentGroupStore`]. Every backend generates ids,
//! keeps names unique and returns listings ordered by name.

pub mod config;
pub mod filesystem;
pub mod memory;
mod records;
pub mod types;

use async_trait::async_trait;
use std::io;
use std::sync::Arc;

pub use config::StoreConfig;
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use types::{Assignment, SegmentGroup, SegmentGroupDraft};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no segment group with id {0}")]
    NotFound(String),
    #[error("a segment group named {0:?} already exists")]
    UniqueViolation(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

#[async_trait]
pub trait SegmentGroupStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SegmentGroup>, StoreError>;
    async fn get(&self, id: &str) -> Result<SegmentGroup, StoreError>;
    async fn create(&self, draft: SegmentGroupDraft) -> Result<SegmentGroup, StoreError>;
    async fn update(&self, id: &str, draft: SegmentGroupDraft)
    -> Result<SegmentGroup, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    /// Moves a segment between the include and exclude lists of group `id`
    /// in one step, so concurrent assignments on a group do not overwrite
    /// each other.
    async fn assign(
        &self,
        id: &str,
        segment_id: &str,
        assignment: Assignment,
    ) -> Result<SegmentGroup, StoreError>;
}

/// Builds the backend selected by `config`.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn SegmentGroupStore>, StoreError> {
    match config {
        StoreConfig::Memory => {
            tracing::warn!("segment groups are kept in memory and will be lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::Filesystem {
            base_dir,
            filename,
            compression,
        } => Ok(Arc::new(FilesystemStore::open(
            base_dir,
            filename,
            (*compression).into(),
        )?)),
    }
}
