// Scheduler worker
//
// Hosts the dispatcher for one process: loads an optional seed snapshot into
// the in-memory store, re-arms persisted schedules and keeps them running
// until shutdown.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info};
use upkeep_core::schedule::TemplateWorkItemGenerator;
use upkeep_core::{
    AutomationEngine, Clock, Dispatcher, InMemoryMaintenanceStore, ScheduleEditor, Snapshot,
    SystemClock, TelemetryConfig, UpkeepConfig,
};

/// How often the run loop reports the number of armed timers
const STATUS_INTERVAL: Duration = Duration::from_secs(300);

const DEFAULT_SERVICE_NAME: &str = "upkeep-worker";
const DEFAULT_LOG_FILTER: &str = "upkeep_worker=info,upkeep_core=info";

/// Telemetry settings for the worker process
///
/// Output format follows `config.log_json`; service name and filter fall back
/// to the worker's defaults when `base` leaves them unset.
pub fn telemetry_config(config: &UpkeepConfig, base: TelemetryConfig) -> TelemetryConfig {
    let mut telemetry = base.with_json(config.log_json);
    if telemetry.service_name == TelemetryConfig::default().service_name {
        telemetry.service_name = DEFAULT_SERVICE_NAME.to_string();
    }
    if telemetry.log_filter.is_none() {
        telemetry.log_filter = Some(DEFAULT_LOG_FILTER.to_string());
    }
    telemetry
}

/// Read a JSON snapshot from disk
pub fn load_seed(path: &Path) -> Result<Snapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    Snapshot::from_json(&json)
        .with_context(|| format!("Failed to parse seed file {}", path.display()))
}

/// Owns the store, automation engine and dispatcher of one process
pub struct SchedulerWorker {
    config: UpkeepConfig,
    store: Arc<InMemoryMaintenanceStore>,
    automation: Arc<AutomationEngine>,
    dispatcher: Dispatcher,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SchedulerWorker {
    /// Build the worker with the system clock
    pub fn new(config: UpkeepConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: UpkeepConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = match &config.seed_file {
            Some(path) => {
                let snapshot = load_seed(path)?;
                info!(
                    path = %path.display(),
                    schedules = snapshot.schedules.len(),
                    workflows = snapshot.workflows.len(),
                    "Loaded seed snapshot"
                );
                InMemoryMaintenanceStore::from_snapshot(snapshot)
            }
            None => InMemoryMaintenanceStore::new(),
        };
        let store = Arc::new(store);

        let automation = Arc::new(AutomationEngine::new(store.clone()));
        let generator = Arc::new(
            TemplateWorkItemGenerator::new(store.clone(), clock.clone())
                .with_automation(automation.clone()),
        );
        let dispatcher = Dispatcher::new(
            store.clone(),
            generator,
            clock,
            config.staleness_policy(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            staleness_window = config.staleness_window,
            restore_on_startup = config.restore_on_startup,
            "Scheduler worker initialized"
        );

        Ok(Self {
            config,
            store,
            automation,
            dispatcher,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn store(&self) -> Arc<InMemoryMaintenanceStore> {
        self.store.clone()
    }

    pub fn automation(&self) -> Arc<AutomationEngine> {
        self.automation.clone()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Editor bound to this worker's store and dispatcher
    pub fn editor(&self) -> ScheduleEditor {
        ScheduleEditor::new(self.store.clone(), self.dispatcher.clone())
    }

    /// Run until [`shutdown`](Self::shutdown) is called
    pub async fn run(&mut self) -> Result<()> {
        if self.config.restore_on_startup {
            let armed = self
                .dispatcher
                .restore_all()
                .await
                .context("Failed to restore schedules")?;
            info!(armed, "Schedules restored");
        }

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(STATUS_INTERVAL) => {
                    debug!(armed = self.dispatcher.armed_count(), "Dispatcher status");
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.dispatcher.shutdown();
        info!("Scheduler worker stopped");
        Ok(())
    }

    /// Signal the worker to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Handle for signalling shutdown from another task
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }
}
