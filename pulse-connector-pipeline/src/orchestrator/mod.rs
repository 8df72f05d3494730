//! Orchestrator module for the pulse connector pipeline.
//!
//! Coordinates the fetcher, processor, and loader components.

use tracing::{error, info, instrument, warn};

use crate::errors::PipelineError;
use crate::fetcher::{PulseFetcher, SUBSCRIBED_PULSES_ENDPOINT};
use crate::loader::{DocumentLoader, LoadOutcome};
use crate::processor::PulseProcessor;

/// Summary of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Number of pages fetched.
    pub pages: u32,
    /// Number of records successfully transformed.
    pub documents: usize,
    /// Number of invalid records skipped.
    pub skipped: usize,
    /// Write outcome counts from the loader.
    pub outcome: LoadOutcome,
}

/// Orchestrator that coordinates the pipeline components.
///
/// Control flows strictly Fetcher -> Processor -> Loader, one page at a
/// time, with no component calling back into an earlier one. The whole run
/// is sequential; the only waiting happens inside network calls and the
/// fetcher's backoff sleeps.
pub struct Orchestrator {
    fetcher: PulseFetcher,
    processor: PulseProcessor,
    loader: DocumentLoader,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(fetcher: PulseFetcher, processor: PulseProcessor, loader: DocumentLoader) -> Self {
        Self {
            fetcher,
            processor,
            loader,
        }
    }

    /// Run the paginated pulse pipeline to completion.
    ///
    /// Verifies the store is reachable before the first fetch; an
    /// unreachable store aborts the run with nothing processed. A fetch
    /// failure (retry exhaustion or a hard HTTP status) stops pagination:
    /// everything already transformed is flushed and the partial progress is
    /// reported before the error propagates.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        info!("Starting pulse connector pipeline");

        self.check_store().await?;
        self.loader.ensure_index().await?;

        let mut pages = 0u32;
        let mut documents = 0usize;
        let mut skipped = 0usize;

        let mut cursor = self.fetcher.pages(SUBSCRIBED_PULSES_ENDPOINT);

        loop {
            match cursor.next_page().await {
                Ok(Some(page)) => {
                    pages += 1;
                    let processed = self.processor.process_page(page.records, page.number);
                    documents += processed.documents.len();
                    skipped += processed.skipped;
                    self.loader.load(processed.documents).await;
                }
                Ok(None) => break,
                Err(e) => {
                    self.loader.flush().await;
                    let outcome = self.loader.outcome();
                    error!(
                        error = %e,
                        pages = pages,
                        documents = documents,
                        upserted = outcome.upserted,
                        modified = outcome.modified,
                        failed = outcome.failed,
                        "Fetch failed, stopping run after partial progress"
                    );
                    return Err(e);
                }
            }
        }

        self.loader.flush().await;
        let outcome = self.loader.outcome();

        info!(
            pages = pages,
            documents = documents,
            skipped = skipped,
            upserted = outcome.upserted,
            modified = outcome.modified,
            failed = outcome.failed,
            "Pipeline run complete"
        );

        Ok(RunSummary {
            pages,
            documents,
            skipped,
            outcome,
        })
    }

    /// Run the single-record observation pipeline for the given city.
    ///
    /// Fetches one observation, transforms it, and loads it. An invalid
    /// observation is skipped (and counted) rather than failing the run.
    #[instrument(skip(self))]
    pub async fn run_observation(&mut self, city: &str) -> Result<RunSummary, PipelineError> {
        info!(city = %city, "Starting observation pipeline");

        self.check_store().await?;
        self.loader.ensure_index().await?;

        let raw = self.fetcher.fetch_observation(city).await?;

        let (documents, skipped) = match self.processor.transform_observation(raw) {
            Ok(document) => {
                self.loader.load(vec![document]).await;
                (1, 0)
            }
            Err(PipelineError::InvalidRecord(reason)) => {
                warn!(city = %city, reason = %reason, "Skipping invalid observation");
                (0, 1)
            }
            Err(e) => return Err(e),
        };

        self.loader.flush().await;
        let outcome = self.loader.outcome();

        info!(
            documents = documents,
            skipped = skipped,
            upserted = outcome.upserted,
            "Observation run complete"
        );

        Ok(RunSummary {
            pages: 1,
            documents,
            skipped,
            outcome,
        })
    }

    /// Verify the document store is reachable before fetching anything.
    async fn check_store(&self) -> Result<(), PipelineError> {
        let reachable = self.loader.ping().await?;
        if !reachable {
            return Err(PipelineError::store_unreachable(
                "liveness probe failed before the run",
            ));
        }
        info!("Document store connection verified");
        Ok(())
    }
}
