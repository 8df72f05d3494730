//! Document store trait definition.
//!
//! This module defines the abstract interface for document store operations,
//! allowing for different backend implementations (OpenSearch, mock, etc.).

use async_trait::async_trait;

use crate::errors::StoreError;
use pulse_connector_shared::PulseDocument;

/// Outcome of an upsert operation for a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No document existed for the identifier; a new one was created.
    Created,
    /// An existing document for the identifier was replaced.
    Updated,
}

/// Abstract interface for document store operations.
///
/// This trait defines all the operations required to persist normalized
/// documents. Implementations can be swapped for different backends
/// (OpenSearch, mock, etc.) enabling easy testing.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, StoreError>` for consistent error handling.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check if the document store is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the store responded to the liveness probe
    /// * `Ok(false)` - If the store could not be reached
    /// * `Err(StoreError)` - If the probe itself failed to execute
    async fn ping(&self) -> Result<bool, StoreError>;

    /// Ensure the target index exists with proper mappings.
    ///
    /// If the index doesn't exist, it will be created. This should be called
    /// once at the start of a run, before any documents are written.
    async fn ensure_index_exists(&self) -> Result<(), StoreError>;

    /// Insert or replace a document keyed by its natural identifier.
    ///
    /// Writing the same document twice must not create a duplicate: the
    /// second write replaces the stored document for that identifier. The
    /// store is assumed to apply each upsert atomically per document.
    ///
    /// # Arguments
    ///
    /// * `document` - The document to upsert; must carry a `pulse_id`
    ///
    /// # Returns
    ///
    /// * `Ok(UpsertOutcome)` - Whether the document was created or replaced
    /// * `Err(StoreError)` - If the write fails
    async fn upsert_document(&self, document: &PulseDocument) -> Result<UpsertOutcome, StoreError>;

    /// Insert a document without an idempotency key.
    ///
    /// Used for documents that lack a natural identifier. Re-running the
    /// connector may produce duplicates for such documents; this is accepted.
    async fn insert_document(&self, document: &PulseDocument) -> Result<(), StoreError>;
}
