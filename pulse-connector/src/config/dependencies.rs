//! Dependency initialization and wiring for the pulse connector.

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::ConnectorError;
use pulse_connector_pipeline::{
    fetcher::{FetcherConfig, PulseFetcher},
    loader::{DocumentLoader, LoaderConfig},
    orchestrator::Orchestrator,
    processor::PulseProcessor,
};
use pulse_connector_repository::OpenSearchClient;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from validated settings.
    ///
    /// Builds the store client, fetcher, processor and loader, and wires
    /// them into an orchestrator. Each component owns its own connection;
    /// everything is released when the returned container is dropped at the
    /// end of the run.
    pub async fn new(settings: &Settings) -> Result<Self, ConnectorError> {
        info!(
            store_url = %settings.store_url,
            index = %settings.index_name(),
            connector = %settings.connector_name,
            "Initializing dependencies"
        );

        let store = OpenSearchClient::new(&settings.store_url, settings.index_name()).await?;

        let fetcher = PulseFetcher::new(
            &settings.base_url,
            &settings.api_key,
            &settings.connector_name,
            FetcherConfig {
                page_size: settings.page_size,
                max_pages: settings.max_pages,
                ..FetcherConfig::default()
            },
        )?;

        let processor = PulseProcessor::new(
            &settings.connector_name,
            settings.source_tag(),
            &settings.base_url,
            settings.city.clone(),
        );

        let loader = DocumentLoader::with_config(
            Arc::new(store),
            LoaderConfig {
                batch_size: settings.batch_size,
            },
        );

        let orchestrator = Orchestrator::new(fetcher, processor, loader);

        Ok(Self { orchestrator })
    }
}
