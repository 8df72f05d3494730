//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `DocumentStore`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    IndexParts, OpenSearch, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::{DocumentStore, UpsertOutcome};
use crate::opensearch::index_config::index_settings;
use pulse_connector_shared::PulseDocument;

/// OpenSearch implementation of the document store.
///
/// Upserts are keyed by the document's `pulse_id`, using the update API with
/// `doc_as_upsert` so that re-loading the same document replaces the stored
/// copy instead of creating a duplicate.
///
/// # Example
///
/// ```ignore
/// let store = OpenSearchClient::new("http://localhost:9200", "otx_pulses_raw").await?;
/// store.ensure_index_exists().await?;
/// let outcome = store.upsert_document(&document).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index: String,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index` - The index documents are written to
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(StoreError)` - If connection setup fails
    pub async fn new(url: &str, index: impl Into<String>) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);
        let index = index.into();

        info!(url = %url, index = %index, "Created document store client");

        Ok(Self { client, index })
    }

    /// The index this client writes to.
    pub fn index(&self) -> &str {
        &self.index
    }
}

#[async_trait]
impl DocumentStore for OpenSearchClient {
    async fn ping(&self) -> Result<bool, StoreError> {
        match self.client.ping().send().await {
            Ok(response) => Ok(response.status_code().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn ensure_index_exists(&self) -> Result<(), StoreError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index.as_str()]))
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %self.index, "Document index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index))
            .body(index_settings())
            .send()
            .await
            .map_err(|e| StoreError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(StoreError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.index, "Created document index");
        Ok(())
    }

    /// Insert or replace a document keyed by its `pulse_id`.
    ///
    /// Uses the update API with `doc_as_upsert`, so the store decides whether
    /// the identifier was already present. The response `result` field tells
    /// the two cases apart.
    async fn upsert_document(&self, document: &PulseDocument) -> Result<UpsertOutcome, StoreError> {
        let doc_id = document
            .pulse_id
            .as_deref()
            .ok_or_else(|| StoreError::upsert("document has no pulse_id"))?;

        let doc = serde_json::to_value(document)
            .map_err(|e| StoreError::serialization(e.to_string()))?;

        let response = self
            .client
            .update(UpdateParts::IndexId(&self.index, doc_id))
            .body(json!({
                "doc": doc,
                "doc_as_upsert": true
            }))
            .send()
            .await
            .map_err(|e| StoreError::upsert(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, pulse_id = %doc_id, body = %error_body, "Upsert request failed");
            return Err(StoreError::upsert(format!(
                "Upsert failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::upsert(e.to_string()))?;

        let outcome = match body.get("result").and_then(Value::as_str) {
            Some("created") => UpsertOutcome::Created,
            _ => UpsertOutcome::Updated,
        };

        debug!(pulse_id = %doc_id, outcome = ?outcome, "Document upserted");
        Ok(outcome)
    }

    async fn insert_document(&self, document: &PulseDocument) -> Result<(), StoreError> {
        let response = self
            .client
            .index(IndexParts::Index(&self.index))
            .body(document)
            .send()
            .await
            .map_err(|e| StoreError::insert(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Insert request failed");
            return Err(StoreError::insert(format!(
                "Insert failed with status {}: {}",
                status, error_body
            )));
        }

        debug!("Document inserted without identifier");
        Ok(())
    }
}
