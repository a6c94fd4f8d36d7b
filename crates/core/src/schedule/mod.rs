//! Recurring schedule dispatch
//!
//! This module provides:
//! - [`recurrence`] - occurrence arithmetic shared by preview and dispatch
//! - [`StalenessPolicy`] - self-disable rule for schedules with a stuck backlog
//! - [`Dispatcher`] - per-schedule timers that generate work items
//! - [`Calendar`] - read-only projection of upcoming occurrences
//! - [`ScheduleEditor`] - validated edits that keep timers in sync

mod calendar;
mod dispatcher;
mod editor;
mod generator;
pub mod recurrence;
mod staleness;

pub use calendar::Calendar;
pub use dispatcher::Dispatcher;
pub use editor::{NewSchedule, ScheduleEditor, ScheduleUpdate};
pub use generator::{TemplateWorkItemGenerator, WorkItemGenerator};
pub use staleness::{StalenessPolicy, DEFAULT_STALENESS_WINDOW};

use uuid::Uuid;

use crate::persistence::StoreError;

/// Errors from scheduling operations
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("frequency must be at least one day, got {0}")]
    InvalidFrequency(u32),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("recurring definition not found: {0}")]
    DefinitionNotFound(Uuid),

    /// Range or series whose end precedes its start
    #[error("invalid window: end precedes start")]
    InvalidWindow,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
