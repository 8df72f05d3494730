use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pulse_connector::{ConnectorError, Dependencies, Settings, SourceMode};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Connector run failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ConnectorError> {
    let settings = Settings::from_env()?;

    info!(
        connector = %settings.connector_name,
        index = %settings.index_name(),
        "Starting pulse connector"
    );

    let mut deps = Dependencies::new(&settings).await?;

    let summary = match settings.mode {
        SourceMode::Pulses => deps.orchestrator.run().await?,
        SourceMode::Weather => {
            // from_env guarantees a city in weather mode
            let city = settings
                .city
                .as_deref()
                .ok_or_else(|| ConnectorError::config("CITY is required when SOURCE_MODE=weather"))?;
            deps.orchestrator.run_observation(city).await?
        }
    };

    info!(
        pages = summary.pages,
        documents = summary.documents,
        skipped = summary.skipped,
        upserted = summary.outcome.upserted,
        modified = summary.outcome.modified,
        failed = summary.outcome.failed,
        "Connector run complete"
    );

    Ok(())
}
