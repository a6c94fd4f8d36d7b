use anyhow::{Context, Result};
use upkeep_core::telemetry::{init_telemetry, TelemetryConfig};
use upkeep_core::UpkeepConfig;
use upkeep_worker::{telemetry_config, SchedulerWorker};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = UpkeepConfig::from_env().context("Invalid configuration")?;

    // Configure via environment variables:
    // - UPKEEP_SERVICE_NAME: Service name (default: "upkeep-worker")
    // - UPKEEP_LOG_JSON: JSON log output, read through UpkeepConfig
    // - RUST_LOG or LOG_LEVEL: Log filter (default: "upkeep_worker=info,upkeep_core=info")
    // Keep the guard alive for the lifetime of the application
    let _telemetry_guard = init_telemetry(telemetry_config(&config, TelemetryConfig::from_env()));

    tracing::info!(
        staleness_window = config.staleness_window,
        seed_file = ?config.seed_file,
        "upkeep-worker starting"
    );

    let mut worker = SchedulerWorker::new(config).context("Failed to create scheduler worker")?;
    let shutdown = worker.shutdown_handle();

    // Run the worker (blocks until shutdown)
    let run = worker.run();
    tokio::pin!(run);
    tokio::select! {
        result = &mut run => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown.send(true);
            run.await?;
        }
    }

    tracing::info!("Worker shutdown complete");
    Ok(())
}
