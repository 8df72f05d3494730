//! Environment-based configuration for the pulse connector.
//!
//! All required options are validated here, before any network call is made.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::ConnectorError;

/// Default base URL for the pulse API.
const DEFAULT_BASE_URL: &str = "https://otx.alienvault.com/api/v1";

/// Default document store URL.
const DEFAULT_STORE_URL: &str = "http://localhost:9200";

/// Default logical database name.
const DEFAULT_DATABASE: &str = "api_testing";

/// Default collection name.
const DEFAULT_COLLECTION: &str = "otx_pulses_raw";

/// Default connector name, stamped into every document.
const DEFAULT_CONNECTOR_NAME: &str = "otx_pulses_connector";

const DEFAULT_PAGE_SIZE: usize = 50;
const DEFAULT_MAX_PAGES: u32 = 100;
const DEFAULT_BATCH_SIZE: usize = 20;

/// Which source variant a run pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Paginated threat-intelligence pulses (the default).
    Pulses,
    /// A single weather observation for the configured city.
    Weather,
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the source API (`OTX_API_KEY`, required).
    pub api_key: String,
    /// Base URL of the source API (`BASE_URL`).
    pub base_url: String,
    /// Document store URL (`STORE_URL`).
    pub store_url: String,
    /// Logical database name (`DB_NAME`).
    pub database: String,
    /// Collection name (`COLLECTION_NAME`).
    pub collection: String,
    /// Connector name (`CONNECTOR_NAME`), stamped into every document.
    pub connector_name: String,
    /// City or query term (`CITY`); required in weather mode.
    pub city: Option<String>,
    /// Source variant (`SOURCE_MODE`, "pulses" or "weather").
    pub mode: SourceMode,
    /// Records per page (`PAGE_SIZE`).
    pub page_size: usize,
    /// Page ceiling per run (`MAX_PAGES`).
    pub max_pages: u32,
    /// Loader batch size (`BATCH_SIZE`).
    pub batch_size: usize,
}

impl Settings {
    /// Read settings from the environment.
    ///
    /// A missing API key, an unknown source mode, a missing city in weather
    /// mode, or an unparsable numeric option is a fatal configuration error.
    pub fn from_env() -> Result<Self, ConnectorError> {
        let api_key = env_var("OTX_API_KEY").ok_or_else(|| {
            ConnectorError::config(
                "OTX_API_KEY missing in environment; create .env from .env.sample and set OTX_API_KEY",
            )
        })?;

        let base_url = env_var("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let store_url = env_var("STORE_URL").unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
        let database = env_var("DB_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let collection = env_var("COLLECTION_NAME").unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let connector_name =
            env_var("CONNECTOR_NAME").unwrap_or_else(|| DEFAULT_CONNECTOR_NAME.to_string());
        let city = env_var("CITY");

        let mode = match env_var("SOURCE_MODE").as_deref() {
            None | Some("pulses") => SourceMode::Pulses,
            Some("weather") => SourceMode::Weather,
            Some(other) => {
                return Err(ConnectorError::config(format!(
                    "SOURCE_MODE must be \"pulses\" or \"weather\", got \"{}\"",
                    other
                )))
            }
        };

        if mode == SourceMode::Weather && city.is_none() {
            return Err(ConnectorError::config("CITY is required when SOURCE_MODE=weather"));
        }

        Ok(Self {
            api_key,
            base_url,
            store_url,
            database,
            collection,
            connector_name,
            city,
            mode,
            page_size: parse_var("PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_pages: parse_var("MAX_PAGES", DEFAULT_MAX_PAGES)?,
            batch_size: parse_var("BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
        })
    }

    /// The store index this run writes to.
    ///
    /// The store has no separate database level, so the logical database and
    /// collection names are flattened into one index name.
    pub fn index_name(&self) -> String {
        format!("{}-{}", self.database, self.collection)
    }

    /// Source tag stamped into every document.
    pub fn source_tag(&self) -> &'static str {
        match self.mode {
            SourceMode::Pulses => "otx",
            SourceMode::Weather => "weather",
        }
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse a numeric environment variable, falling back to a default when unset.
fn parse_var<T>(key: &str, default: T) -> Result<T, ConnectorError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_var(key) {
        Some(value) => value
            .parse()
            .map_err(|e| ConnectorError::config(format!("{} is not a valid number: {}", key, e))),
        None => Ok(default),
    }
}
