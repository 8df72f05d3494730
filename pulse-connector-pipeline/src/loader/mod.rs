//! Loader module for the pulse connector pipeline.
//!
//! Upserts normalized documents into the document store in batches.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::PipelineError;
use pulse_connector_repository::{DocumentStore, UpsertOutcome};
use pulse_connector_shared::PulseDocument;

/// Configuration for the document loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents to buffer before flushing to the store.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 20 }
    }
}

/// Running outcome counts for a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Documents written for the first time (plus identifier-less inserts).
    pub upserted: usize,
    /// Documents that replaced an existing copy with the same identifier.
    pub modified: usize,
    /// Documents whose write failed.
    pub failed: usize,
}

impl LoadOutcome {
    /// Total number of write attempts.
    pub fn total(&self) -> usize {
        self.upserted + self.modified + self.failed
    }
}

/// Loader that upserts documents into the document store.
///
/// Documents are buffered and flushed in batches; the batch size decouples
/// memory use from write throughput. A write failure for one document is
/// logged and counted, and the rest of the batch is still attempted.
pub struct DocumentLoader {
    client: Arc<dyn DocumentStore>,
    config: LoaderConfig,
    pending: Vec<PulseDocument>,
    outcome: LoadOutcome,
}

impl DocumentLoader {
    /// Create a new loader with the default configuration.
    pub fn new(client: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new loader with custom configuration.
    pub fn with_config(client: Arc<dyn DocumentStore>, config: LoaderConfig) -> Self {
        let batch_size = config.batch_size;
        Self {
            client,
            config,
            pending: Vec::with_capacity(batch_size),
            outcome: LoadOutcome::default(),
        }
    }

    /// Buffer documents for loading, flushing when the batch fills up.
    pub async fn load(&mut self, documents: Vec<PulseDocument>) {
        for document in documents {
            self.pending.push(document);
            if self.pending.len() >= self.config.batch_size {
                self.flush().await;
            }
        }
    }

    /// Flush all buffered documents to the store.
    ///
    /// Documents with an identifier are upserted (replace-by-identifier);
    /// identifier-less documents are inserted best-effort. Failures are
    /// absorbed into the outcome counts.
    pub async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let documents: Vec<PulseDocument> = self.pending.drain(..).collect();
        let count = documents.len();

        debug!(count = count, "Flushing documents to store");

        for document in documents {
            match document.pulse_id.as_deref() {
                Some(pulse_id) => match self.client.upsert_document(&document).await {
                    Ok(UpsertOutcome::Created) => self.outcome.upserted += 1,
                    Ok(UpsertOutcome::Updated) => self.outcome.modified += 1,
                    Err(e) => {
                        error!(pulse_id = %pulse_id, error = %e, "Failed to upsert document");
                        self.outcome.failed += 1;
                    }
                },
                None => match self.client.insert_document(&document).await {
                    Ok(()) => {
                        warn!("Document has no pulse_id, inserted without idempotency key");
                        self.outcome.upserted += 1;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to insert document");
                        self.outcome.failed += 1;
                    }
                },
            }
        }

        info!(
            count = count,
            upserted = self.outcome.upserted,
            modified = self.outcome.modified,
            failed = self.outcome.failed,
            "Batch flushed"
        );
    }

    /// Outcome counts accumulated so far.
    pub fn outcome(&self) -> LoadOutcome {
        self.outcome
    }

    /// Check if the document store is reachable.
    pub async fn ping(&self) -> Result<bool, PipelineError> {
        self.client
            .ping()
            .await
            .map_err(|e| PipelineError::loader(e.to_string()))
    }

    /// Ensure the target index exists.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        self.client
            .ensure_index_exists()
            .await
            .map_err(|e| PipelineError::loader(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_connector_repository::StoreError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Mock document store for testing.
    ///
    /// Keeps documents keyed by identifier so idempotency is observable, and
    /// can be told to fail writes for a specific identifier.
    struct MockStore {
        documents: Mutex<HashMap<String, PulseDocument>>,
        inserted_without_id: AtomicUsize,
        fail_pulse_id: Option<String>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                documents: Mutex::new(HashMap::new()),
                inserted_without_id: AtomicUsize::new(0),
                fail_pulse_id: None,
            }
        }

        fn failing_on(pulse_id: &str) -> Self {
            Self {
                fail_pulse_id: Some(pulse_id.to_string()),
                ..Self::new()
            }
        }

        async fn stored_count(&self) -> usize {
            self.documents.lock().await.len()
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn ping(&self) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn ensure_index_exists(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn upsert_document(
            &self,
            document: &PulseDocument,
        ) -> Result<UpsertOutcome, StoreError> {
            let pulse_id = document
                .pulse_id
                .clone()
                .ok_or_else(|| StoreError::upsert("document has no pulse_id"))?;

            if self.fail_pulse_id.as_deref() == Some(pulse_id.as_str()) {
                return Err(StoreError::upsert("mock failure"));
            }

            let previous = self
                .documents
                .lock()
                .await
                .insert(pulse_id, document.clone());

            Ok(match previous {
                Some(_) => UpsertOutcome::Updated,
                None => UpsertOutcome::Created,
            })
        }

        async fn insert_document(&self, _document: &PulseDocument) -> Result<(), StoreError> {
            self.inserted_without_id.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn document(pulse_id: Option<&str>) -> PulseDocument {
        let mut doc = PulseDocument::new(
            json!({"id": pulse_id}),
            "test_connector",
            "otx",
            "https://otx.example.com",
            None,
        );
        doc.pulse_id = pulse_id.map(str::to_owned);
        doc
    }

    #[tokio::test]
    async fn test_load_and_flush() {
        let store = Arc::new(MockStore::new());
        let mut loader = DocumentLoader::new(store.clone());

        loader.load(vec![document(Some("a")), document(Some("b"))]).await;
        loader.flush().await;

        assert_eq!(store.stored_count().await, 2);
        assert_eq!(
            loader.outcome(),
            LoadOutcome { upserted: 2, modified: 0, failed: 0 }
        );
    }

    #[tokio::test]
    async fn test_reloading_same_document_is_idempotent() {
        let store = Arc::new(MockStore::new());
        let mut loader = DocumentLoader::new(store.clone());

        loader.load(vec![document(Some("a"))]).await;
        loader.flush().await;
        loader.load(vec![document(Some("a"))]).await;
        loader.flush().await;

        // The second load replaces the stored copy rather than duplicating it.
        assert_eq!(store.stored_count().await, 1);
        assert_eq!(
            loader.outcome(),
            LoadOutcome { upserted: 1, modified: 1, failed: 0 }
        );
    }

    #[tokio::test]
    async fn test_flush_at_batch_size() {
        let store = Arc::new(MockStore::new());
        let mut loader =
            DocumentLoader::with_config(store.clone(), LoaderConfig { batch_size: 2 });

        loader
            .load(vec![document(Some("a")), document(Some("b")), document(Some("c"))])
            .await;

        // The first two flushed when the batch filled; the third is pending.
        assert_eq!(store.stored_count().await, 2);

        loader.flush().await;
        assert_eq!(store.stored_count().await, 3);
    }

    #[tokio::test]
    async fn test_write_failure_does_not_abort_batch() {
        let store = Arc::new(MockStore::failing_on("b"));
        let mut loader = DocumentLoader::new(store.clone());

        loader
            .load(vec![document(Some("a")), document(Some("b")), document(Some("c"))])
            .await;
        loader.flush().await;

        assert_eq!(store.stored_count().await, 2);
        assert_eq!(
            loader.outcome(),
            LoadOutcome { upserted: 2, modified: 0, failed: 1 }
        );
    }

    #[tokio::test]
    async fn test_document_without_identifier_is_inserted() {
        let store = Arc::new(MockStore::new());
        let mut loader = DocumentLoader::new(store.clone());

        loader.load(vec![document(None)]).await;
        loader.flush().await;

        assert_eq!(store.inserted_without_id.load(Ordering::SeqCst), 1);
        assert_eq!(
            loader.outcome(),
            LoadOutcome { upserted: 1, modified: 0, failed: 0 }
        );
    }

    #[tokio::test]
    async fn test_flush_on_empty_buffer_is_a_no_op() {
        let store = Arc::new(MockStore::new());
        let mut loader = DocumentLoader::new(store.clone());

        loader.flush().await;

        assert_eq!(loader.outcome(), LoadOutcome::default());
    }
}
