//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the pulse
//! document index.

use serde_json::{json, Value};

/// Get the index settings and mappings for the pulse document index.
///
/// The extracted scalar fields are mapped as keywords for exact lookups;
/// the `raw` payload is stored but not indexed, since it only exists so no
/// information from the source record is lost.
pub fn index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "pulse_id": {
                    "type": "keyword"
                },
                "name": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "created": {
                    "type": "keyword"
                },
                "modified": {
                    "type": "keyword"
                },
                "indicator_count": {
                    "type": "long"
                },
                "connector_name": {
                    "type": "keyword"
                },
                "source": {
                    "type": "keyword"
                },
                "source_base_url": {
                    "type": "keyword",
                    "index": false
                },
                "source_city": {
                    "type": "keyword"
                },
                "ingested_at": {
                    "type": "date"
                },
                "raw": {
                    "type": "object",
                    "enabled": false
                }
            }
        }
    })
}
