// Runtime configuration
//
// UpkeepConfig collects the knobs the dispatcher and the worker binary need.
// Values come from the environment with defaults; invalid values are errors
// rather than silently falling back.

use std::path::PathBuf;

use crate::domain::WorkItemStatus;
use crate::schedule::{StalenessPolicy, DEFAULT_STALENESS_WINDOW};

/// Invalid configuration value
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Configuration for the schedule dispatcher and its host process
#[derive(Debug, Clone, PartialEq)]
pub struct UpkeepConfig {
    /// How many recent generated work items the staleness guard inspects
    pub staleness_window: usize,
    /// Statuses that count a generated work item as done
    pub done_statuses: Vec<WorkItemStatus>,
    /// Re-arm every persisted schedule at start-up
    pub restore_on_startup: bool,
    /// JSON snapshot loaded into the in-memory store
    pub seed_file: Option<PathBuf>,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for UpkeepConfig {
    fn default() -> Self {
        Self {
            staleness_window: DEFAULT_STALENESS_WINDOW,
            done_statuses: vec![WorkItemStatus::Complete],
            restore_on_startup: true,
            seed_file: None,
            log_json: false,
        }
    }
}

impl UpkeepConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `UPKEEP_STALENESS_WINDOW`: items inspected by the staleness guard (default: 10, > 0)
    /// - `UPKEEP_STALENESS_DONE_STATUSES`: comma list of done statuses (default: "complete")
    /// - `UPKEEP_RESTORE_ON_STARTUP`: re-arm persisted schedules (default: true)
    /// - `UPKEEP_SEED_FILE`: path to a JSON snapshot
    /// - `UPKEEP_LOG_JSON`: JSON log output (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing keys take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("UPKEEP_STALENESS_WINDOW") {
            let window: usize = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("UPKEEP_STALENESS_WINDOW", &raw, "not a number"))?;
            if window == 0 {
                return Err(ConfigError::invalid(
                    "UPKEEP_STALENESS_WINDOW",
                    &raw,
                    "must be greater than zero",
                ));
            }
            config.staleness_window = window;
        }

        if let Some(raw) = lookup("UPKEEP_STALENESS_DONE_STATUSES") {
            let statuses = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<WorkItemStatus>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::invalid("UPKEEP_STALENESS_DONE_STATUSES", &raw, e))?;
            if statuses.is_empty() {
                return Err(ConfigError::invalid(
                    "UPKEEP_STALENESS_DONE_STATUSES",
                    &raw,
                    "at least one status is required",
                ));
            }
            config.done_statuses = statuses;
        }

        if let Some(raw) = lookup("UPKEEP_RESTORE_ON_STARTUP") {
            config.restore_on_startup = parse_bool("UPKEEP_RESTORE_ON_STARTUP", &raw)?;
        }

        config.seed_file = lookup("UPKEEP_SEED_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup("UPKEEP_LOG_JSON") {
            config.log_json = parse_bool("UPKEEP_LOG_JSON", &raw)?;
        }

        Ok(config)
    }

    pub fn with_staleness_window(mut self, window: usize) -> Self {
        self.staleness_window = window;
        self
    }

    pub fn with_done_statuses(mut self, statuses: Vec<WorkItemStatus>) -> Self {
        self.done_statuses = statuses;
        self
    }

    pub fn with_restore_on_startup(mut self, restore: bool) -> Self {
        self.restore_on_startup = restore;
        self
    }

    pub fn with_seed_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_file = Some(path.into());
        self
    }

    /// Staleness policy for the dispatcher
    pub fn staleness_policy(&self) -> StalenessPolicy {
        StalenessPolicy::new(self.staleness_window, self.done_statuses.clone())
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected true or false")),
    }
}
