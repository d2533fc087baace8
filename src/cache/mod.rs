//! Cache module for persisting the computed dataset to disk
//!
//! The cache holds exactly one blob: the projected character dataset. Presence
//! of the blob is the only validity signal; there is no TTL and no checksum.
//! Once written, the blob is never invalidated by the service itself.

mod file_store;

pub use file_store::{FileCacheStore, BLOB_NAME};

use std::path::PathBuf;
use thiserror::Error;

use crate::data::Dataset;

/// Errors that can occur when reading or writing the cache blob
#[derive(Debug, Error)]
pub enum CacheError {
    /// The blob exists but could not be parsed into a dataset
    #[error("Corrupt cache blob at {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The underlying medium could not be read or written
    #[error("Cache store unavailable at {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read was attempted while no blob is present
    #[error("No cache blob at {}", .path.display())]
    Missing { path: PathBuf },

    /// The blocking task running a store operation panicked or was cancelled
    #[error("Cache task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

/// Durable storage for the single dataset blob
///
/// Implementations must replace the blob atomically so that concurrent readers
/// never observe a half-written dataset.
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Returns true when a blob is present
    fn exists(&self) -> bool;

    /// Reads and decodes the blob
    fn read(&self) -> Result<Dataset, CacheError>;

    /// Replaces the blob with `dataset`
    fn write(&self, dataset: &Dataset) -> Result<(), CacheError>;
}
