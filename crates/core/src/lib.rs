//! # Upkeep Core
//!
//! Preventive-maintenance scheduling and workflow automation for a
//! multi-tenant maintenance platform.
//!
//! ## Features
//!
//! - **Recurring schedules**: one timer per schedule, re-armed after every fire
//! - **Staleness guard**: a schedule whose recent work items are all still open disables itself
//! - **Calendar projection**: upcoming occurrences without touching timers
//! - **Workflow automation**: closed trigger, condition and action vocabularies
//! - **Plan governance**: bulk enable/disable of a tenant's workflows
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                            │
//! │  (per-schedule timers, staleness guard, re-arm after fire)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TemplateWorkItemGenerator                  │
//! │  (work item + tasks from the definition template)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     AutomationEngine                         │
//! │  (WorkItemCreated and other triggers, apply actions)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MaintenanceStore                         │
//! │  (schedules, definitions, entities, workflows)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upkeep_core::prelude::*;
//!
//! let store = Arc::new(InMemoryMaintenanceStore::new());
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let automation = Arc::new(AutomationEngine::new(store.clone()));
//! let generator = Arc::new(
//!     TemplateWorkItemGenerator::new(store.clone(), clock.clone()).with_automation(automation),
//! );
//! let dispatcher = Dispatcher::new(store.clone(), generator, clock, StalenessPolicy::default());
//! let editor = ScheduleEditor::new(store, dispatcher.clone());
//!
//! let definition = RecurringDefinition::new(tenant_id, "Boiler inspection");
//! editor.create_definition(&definition, NewSchedule::every(30)).await?;
//! ```

pub mod automation;
pub mod clock;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod schedule;
pub mod telemetry;

/// Prelude for common imports
pub mod prelude {
    pub use crate::automation::{
        ActionOutcome, AutomationEngine, AutomationError, PlanGovernance, RunReport, Subject,
    };
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::UpkeepConfig;
    pub use crate::domain::{
        RecurringDefinition, Schedule, TriggerKind, WorkItem, WorkItemStatus, Workflow,
        WorkflowAction, WorkflowCondition,
    };
    pub use crate::persistence::{InMemoryMaintenanceStore, MaintenanceStore, StoreError};
    pub use crate::schedule::{
        Calendar, Dispatcher, NewSchedule, ScheduleEditor, ScheduleUpdate, SchedulingError,
        StalenessPolicy, TemplateWorkItemGenerator,
    };
}

// Re-export key types at crate root
pub use automation::{AutomationEngine, AutomationError, PlanGovernance};
pub use clock::{Clock, SystemClock, TokioClock};
pub use config::{ConfigError, UpkeepConfig};
pub use persistence::{InMemoryMaintenanceStore, MaintenanceStore, Snapshot, StoreError};
pub use schedule::{Calendar, Dispatcher, ScheduleEditor, SchedulingError, StalenessPolicy};
pub use telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
