//! Single-process host for the schedule dispatcher and automation engine

pub mod scheduler_worker;

// Re-export main types
pub use scheduler_worker::{load_seed, telemetry_config, SchedulerWorker};
