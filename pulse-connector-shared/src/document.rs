//! Normalized document types.
//!
//! Defines the document shape that is persisted to the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized document produced from one raw API record.
///
/// Extracted scalar fields are optional: a field that is absent in the raw
/// record stays `None` and is omitted from the serialized document. The full
/// raw record is always carried in `raw`, and `ingested_at` is stamped at
/// transformation time, so every persisted document can be traced back to
/// its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseDocument {
    /// Natural identifier of the record, used as the upsert key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_id: Option<String>,
    /// Human-readable name of the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation time as reported by the source API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Last modification time as reported by the source API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Indicator count, when the source exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator_count: Option<i64>,
    /// Name of the connector that produced this document.
    pub connector_name: String,
    /// Source tag (e.g. "otx").
    pub source: String,
    /// Base URL of the source API.
    pub source_base_url: String,
    /// City or query term the run was scoped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_city: Option<String>,
    /// Wall-clock time at which the record was transformed.
    pub ingested_at: DateTime<Utc>,
    /// Full copy of the raw record as received from the API.
    pub raw: Value,
}

impl PulseDocument {
    /// Create a document carrying the given raw record and run metadata.
    ///
    /// The ingestion timestamp is stamped here; extracted scalar fields start
    /// out unset and are filled in by the processor.
    pub fn new(
        raw: Value,
        connector_name: impl Into<String>,
        source: impl Into<String>,
        source_base_url: impl Into<String>,
        source_city: Option<String>,
    ) -> Self {
        Self {
            pulse_id: None,
            name: None,
            created: None,
            modified: None,
            indicator_count: None,
            connector_name: connector_name.into(),
            source: source.into(),
            source_base_url: source_base_url.into(),
            source_city,
            ingested_at: Utc::now(),
            raw,
        }
    }

    /// Whether this document carries a natural identifier for upserting.
    pub fn has_identifier(&self) -> bool {
        self.pulse_id.is_some()
    }
}
