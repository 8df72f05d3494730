//! Pulse processor implementation.
//!
//! Transforms raw records into `PulseDocument` structures for loading. The
//! processor does no I/O: it only reshapes records and stamps run metadata.

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::PipelineError;
use pulse_connector_shared::PulseDocument;

/// Result of processing one page of raw records.
#[derive(Debug)]
pub struct ProcessedPage {
    /// Documents ready for loading.
    pub documents: Vec<PulseDocument>,
    /// Number of records skipped because they were invalid.
    pub skipped: usize,
}

/// Processor that transforms raw API records into documents.
///
/// Holds the run metadata that gets stamped into every document:
/// connector name, source tag, base URL and the optional city scope.
pub struct PulseProcessor {
    connector_name: String,
    source: String,
    base_url: String,
    city: Option<String>,
}

impl PulseProcessor {
    /// Create a new processor with the given run metadata.
    pub fn new(
        connector_name: impl Into<String>,
        source: impl Into<String>,
        base_url: impl Into<String>,
        city: Option<String>,
    ) -> Self {
        Self {
            connector_name: connector_name.into(),
            source: source.into(),
            base_url: base_url.into(),
            city,
        }
    }

    /// Process one page of raw records.
    ///
    /// Invalid records are logged with their identifier and page number and
    /// skipped; a bad record never aborts the page.
    pub fn process_page(&self, records: Vec<Value>, page: u32) -> ProcessedPage {
        let mut documents = Vec::with_capacity(records.len());
        let mut skipped = 0;

        for record in records {
            let id_hint = record_id_hint(&record);
            match self.transform(record) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(
                        page = page,
                        pulse_id = %id_hint.as_deref().unwrap_or("<unknown>"),
                        error = %e,
                        "Skipping invalid record"
                    );
                    skipped += 1;
                }
            }
        }

        debug!(page = page, count = documents.len(), skipped = skipped, "Processed page");

        ProcessedPage { documents, skipped }
    }

    /// Transform a raw pulse record into a document.
    ///
    /// The full raw record is preserved in the document; on top of that a
    /// small set of scalar fields is extracted for easier querying. Fields
    /// are looked up in the `pulse_info` sub-mapping first and at the top
    /// level second; absent fields stay unset.
    pub fn transform(&self, raw: Value) -> Result<PulseDocument, PipelineError> {
        let (pulse_id, name, created, modified, indicator_count) = {
            let map = raw
                .as_object()
                .ok_or_else(|| PipelineError::invalid_record("record is not a JSON object"))?;
            let pulse_info = map.get("pulse_info").and_then(Value::as_object);
            let lookup = |key: &str| {
                pulse_info
                    .and_then(|info| info.get(key))
                    .or_else(|| map.get(key))
            };

            (
                lookup("id").and_then(scalar_string),
                lookup("name").and_then(Value::as_str).map(str::to_owned),
                lookup("created").and_then(scalar_string),
                lookup("modified").and_then(scalar_string),
                map.get("indicator_count").and_then(Value::as_i64),
            )
        };

        let mut document = self.stamp(raw);
        document.pulse_id = pulse_id;
        document.name = name;
        document.created = created;
        document.modified = modified;
        document.indicator_count = indicator_count;

        Ok(document)
    }

    /// Transform a single weather observation record into a document.
    ///
    /// The `main` metric sub-mapping is required; a record without it fails
    /// with `InvalidRecord`. All other fields are optional.
    pub fn transform_observation(&self, raw: Value) -> Result<PulseDocument, PipelineError> {
        let (observation_id, name, observed_at) = {
            let map = raw
                .as_object()
                .ok_or_else(|| PipelineError::invalid_record("observation is not a JSON object"))?;

            if map.get("main").and_then(Value::as_object).is_none() {
                return Err(PipelineError::invalid_record(
                    "observation is missing the \"main\" metric block",
                ));
            }

            (
                map.get("id").and_then(scalar_string),
                map.get("name").and_then(Value::as_str).map(str::to_owned),
                map.get("dt").and_then(scalar_string),
            )
        };

        let mut document = self.stamp(raw);
        document.pulse_id = observation_id;
        document.name = name;
        document.created = observed_at;

        Ok(document)
    }

    /// Build a document carrying the raw record and run metadata.
    fn stamp(&self, raw: Value) -> PulseDocument {
        PulseDocument::new(
            raw,
            &self.connector_name,
            &self.source,
            &self.base_url,
            self.city.clone(),
        )
    }
}

/// Best-effort identifier for log context, before transformation.
fn record_id_hint(record: &Value) -> Option<String> {
    let map = record.as_object()?;
    map.get("id")
        .or_else(|| map.get("pulse_info").and_then(|info| info.get("id")))
        .and_then(scalar_string)
}

/// Render a scalar JSON value as a string identifier.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
