//! Pagination cursor and response-shape resolution.
//!
//! One cursor drives the page loop for a single run; the page boundary is
//! also the retry granularity, since each page request goes through the
//! fetcher's retry loop as a whole.

use serde_json::Value;
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::fetcher::http_fetcher::PulseFetcher;

/// One page of raw records.
#[derive(Debug)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// Records in the order the API returned them.
    pub records: Vec<Value>,
}

/// Lazy pagination cursor over an endpoint.
///
/// Terminates when a page comes back short (fewer records than the page
/// size), empty, or malformed, or when the configured page ceiling is
/// reached. A short page is still yielded before the cursor finishes.
pub struct PageCursor<'a> {
    fetcher: &'a PulseFetcher,
    url: String,
    next: u32,
    finished: bool,
}

impl<'a> PageCursor<'a> {
    pub(crate) fn new(fetcher: &'a PulseFetcher, endpoint: &str) -> Self {
        let url = format!("{}/{}", fetcher.base_url(), endpoint.trim_start_matches('/'));
        Self {
            fetcher,
            url,
            next: 1,
            finished: false,
        }
    }

    /// Fetch the next page.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Page))` - The next page of records
    /// * `Ok(None)` - Pagination has terminated
    /// * `Err(PipelineError)` - A non-retryable failure or retry exhaustion;
    ///   the caller must stop pagination for this run
    pub async fn next_page(&mut self) -> Result<Option<Page>, PipelineError> {
        if self.finished {
            return Ok(None);
        }

        let config = self.fetcher.config();

        if self.next > config.max_pages {
            info!(max_pages = config.max_pages, "Reached page ceiling, stopping pagination");
            self.finished = true;
            return Ok(None);
        }

        let query = [
            ("limit".to_string(), config.page_size.to_string()),
            ("page".to_string(), self.next.to_string()),
        ];

        debug!(page = self.next, url = %self.url, "Fetching page");
        let body = self.fetcher.get_with_retry(&self.url, &query).await?;

        let records = match resolve_records(&body) {
            Some(records) => records,
            None => {
                // Not an error: the endpoint returned something we don't
                // understand, so stop rather than loop on it.
                info!(page = self.next, "Unexpected response shape, stopping pagination");
                self.finished = true;
                return Ok(None);
            }
        };

        if records.is_empty() {
            info!(page = self.next, "No records on page, stopping pagination");
            self.finished = true;
            return Ok(None);
        }

        if records.len() < config.page_size {
            debug!(
                page = self.next,
                count = records.len(),
                "Short page, treating as last page"
            );
            self.finished = true;
        }

        let number = self.next;
        self.next += 1;

        Ok(Some(Page { number, records }))
    }
}

/// Resolve the record collection out of a response body.
///
/// The API nests records under varying key names. Preference order:
/// a known field (`results`, then `pulses`); if the preferred value is
/// itself a mapping, the first array nested inside it; with no known field,
/// the first array-typed value in the response mapping. A bare top-level
/// array is accepted as-is. Anything else is malformed.
fn resolve_records(body: &Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(records) => Some(records.clone()),
        Value::Object(map) => match map.get("results").or_else(|| map.get("pulses")) {
            Some(Value::Array(records)) => Some(records.clone()),
            Some(Value::Object(inner)) => inner.values().find_map(|v| v.as_array().cloned()),
            Some(_) => None,
            None => map.values().find_map(|v| v.as_array().cloned()),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_results_key() {
        let body = json!({"results": [{"id": 1}, {"id": 2}], "count": 2});
        let records = resolve_records(&body).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_resolve_pulses_key() {
        let body = json!({"pulses": [{"id": 1}]});
        let records = resolve_records(&body).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_results_key_preferred_over_pulses() {
        let body = json!({"pulses": [{"id": "from_pulses"}], "results": [{"id": "from_results"}]});
        let records = resolve_records(&body).unwrap();
        assert_eq!(records[0]["id"], "from_results");
    }

    #[test]
    fn test_resolve_nested_list_inside_preferred_mapping() {
        let body = json!({"results": {"meta": 3, "items": [{"id": 1}, {"id": 2}, {"id": 3}]}});
        let records = resolve_records(&body).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_resolve_first_list_in_response_mapping() {
        let body = json!({"count": 1, "data": [{"id": 1}]});
        let records = resolve_records(&body).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_resolve_bare_array() {
        let body = json!([{"id": 1}, {"id": 2}]);
        let records = resolve_records(&body).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_resolve_malformed_shapes() {
        assert!(resolve_records(&json!({"detail": "endpoint moved"})).is_none());
        assert!(resolve_records(&json!({"results": "nope"})).is_none());
        assert!(resolve_records(&json!("plain string")).is_none());
        assert!(resolve_records(&json!(42)).is_none());
    }

    #[test]
    fn test_resolve_empty_results() {
        let body = json!({"results": []});
        let records = resolve_records(&body).unwrap();
        assert!(records.is_empty());
    }
}
