//! Workflow automation
//!
//! This module provides:
//! - [`matches`] / [`evaluate`] - condition evaluation over a [`Subject`]
//! - [`ActionExecutor`] - applies a workflow action and reports an [`ActionOutcome`]
//! - [`AutomationEngine`] - `run_on_*` trigger points
//! - [`PlanGovernance`] - plan-driven enable/disable of a tenant's workflows

mod action;
mod condition;
mod engine;
mod governance;

pub use action::{ActionExecutor, ActionOutcome, ExternalEffect, SkipReason};
pub use condition::{compare, evaluate, matches, Subject};
pub use engine::{AutomationEngine, RunReport};
pub use governance::PlanGovernance;

use uuid::Uuid;

use crate::domain::{EntityKind, TriggerKind};
use crate::persistence::StoreError;

/// Errors from automation operations
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    /// A workflow's action does not fit its trigger
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// An event was raised with an entity the trigger does not carry
    #[error("trigger {trigger:?} does not carry a {subject}")]
    TriggerMismatch {
        trigger: TriggerKind,
        subject: EntityKind,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
