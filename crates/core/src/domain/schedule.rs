//! Recurring definitions and their schedules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::Priority;

/// Recurrence parameters owned by exactly one [`RecurringDefinition`]
///
/// `disabled` is terminal: once set (by the staleness guard or a user), the
/// dispatcher never arms the schedule again until the flag is explicitly reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub definition_id: Uuid,
    /// Anchor of the series; occurrences are `starts_on + k * frequency_days`
    pub starts_on: DateTime<Utc>,
    pub frequency_days: u32,
    /// Last instant an occurrence may fall on (inclusive)
    #[serde(default)]
    pub ends_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disabled: bool,
}

impl Schedule {
    /// Create an enabled, open-ended schedule for a definition
    pub fn new(definition_id: Uuid, starts_on: DateTime<Utc>, frequency_days: u32) -> Self {
        Self {
            id: Uuid::now_v7(),
            definition_id,
            starts_on,
            frequency_days,
            ends_on: None,
            disabled: false,
        }
    }

    /// Set the inclusive end of the series
    pub fn with_ends_on(mut self, ends_on: DateTime<Utc>) -> Self {
        self.ends_on = Some(ends_on);
        self
    }

    /// Mark the schedule disabled
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Whether the series has ended relative to `now`
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.ends_on.is_some_and(|end| end < now)
    }

    /// Whether the dispatcher must never arm this schedule at `now`
    pub fn is_terminal(&self, now: DateTime<Utc>) -> bool {
        self.disabled || self.has_ended(now)
    }
}

/// A checklist step copied onto every generated work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub label: String,
}

impl TaskTemplate {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// What every generated work item looks like
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemTemplate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub assignees: Vec<Uuid>,
    #[serde(default)]
    pub asset_id: Option<Uuid>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    /// Expected effort in hours
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

/// A preventive-maintenance template that generates work items per its schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub template: WorkItemTemplate,
    #[serde(default)]
    pub tasks: Vec<TaskTemplate>,
    pub created_at: DateTime<Utc>,
}

impl RecurringDefinition {
    pub fn new(tenant_id: Uuid, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            template: WorkItemTemplate {
                title: name.clone(),
                ..Default::default()
            },
            name,
            tasks: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_template(mut self, template: WorkItemTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskTemplate>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A projected occurrence, produced only for range queries and never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent<T> {
    pub payload: T,
    pub occurs_on: DateTime<Utc>,
}

impl<T> CalendarEvent<T> {
    pub fn new(payload: T, occurs_on: DateTime<Utc>) -> Self {
        Self { payload, occurs_on }
    }
}
