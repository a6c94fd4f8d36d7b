//! User-facing edits to recurring definitions and their schedules
//!
//! Every edit validates, persists, then tells the dispatcher, so the live
//! timer always reflects the stored parameters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dispatcher::Dispatcher;
use super::SchedulingError;
use crate::domain::{RecurringDefinition, Schedule};
use crate::persistence::MaintenanceStore;

/// Parameters for a new schedule; `starts_on` defaults to the definition's creation time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSchedule {
    pub frequency_days: u32,
    #[serde(default)]
    pub starts_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_on: Option<DateTime<Utc>>,
}

impl NewSchedule {
    pub fn every(frequency_days: u32) -> Self {
        Self {
            frequency_days,
            ..Default::default()
        }
    }
}

/// Partial update of a schedule; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    #[serde(default)]
    pub starts_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub frequency_days: Option<u32>,
    /// `Some(None)` clears the end date
    #[serde(default)]
    pub ends_on: Option<Option<DateTime<Utc>>>,
}

/// Validates schedule edits and keeps the dispatcher in sync
pub struct ScheduleEditor {
    store: Arc<dyn MaintenanceStore>,
    dispatcher: Dispatcher,
}

impl ScheduleEditor {
    pub fn new(store: Arc<dyn MaintenanceStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Store a definition with its schedule and arm it
    #[instrument(skip(self, definition), fields(definition_id = %definition.id))]
    pub async fn create_definition(
        &self,
        definition: &RecurringDefinition,
        params: NewSchedule,
    ) -> Result<Schedule, SchedulingError> {
        let mut schedule = Schedule::new(
            definition.id,
            params.starts_on.unwrap_or(definition.created_at),
            params.frequency_days,
        );
        schedule.ends_on = params.ends_on;
        validate(&schedule)?;

        self.store.save_definition(definition).await?;
        self.store.save_schedule(&schedule).await?;
        self.dispatcher.schedule_next(&schedule).await?;
        info!(schedule_id = %schedule.id, frequency_days = schedule.frequency_days, "Created recurring definition");
        Ok(schedule)
    }

    /// Change recurrence parameters and re-arm
    #[instrument(skip(self, update))]
    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        update: ScheduleUpdate,
    ) -> Result<Schedule, SchedulingError> {
        let mut schedule = self.load(schedule_id).await?;
        if let Some(starts_on) = update.starts_on {
            schedule.starts_on = starts_on;
        }
        if let Some(frequency_days) = update.frequency_days {
            schedule.frequency_days = frequency_days;
        }
        if let Some(ends_on) = update.ends_on {
            schedule.ends_on = ends_on;
        }
        validate(&schedule)?;

        self.store.save_schedule(&schedule).await?;
        self.dispatcher.reschedule(schedule_id, &schedule).await?;
        Ok(schedule)
    }

    /// Turn a schedule off or back on
    #[instrument(skip(self))]
    pub async fn set_disabled(
        &self,
        schedule_id: Uuid,
        disabled: bool,
    ) -> Result<Schedule, SchedulingError> {
        let mut schedule = self.load(schedule_id).await?;
        schedule.disabled = disabled;
        self.store.save_schedule(&schedule).await?;

        if disabled {
            self.dispatcher.stop(schedule_id);
        } else if self.dispatcher.reschedule(schedule_id, &schedule).await?.is_none() {
            // Still stale: the dispatcher disabled it again
            if let Some(current) = self.store.find_schedule(schedule_id).await? {
                return Ok(current);
            }
        }
        Ok(schedule)
    }

    /// Clear the disabled flag and re-arm
    ///
    /// A schedule whose backlog is still stale is disabled again straight away.
    pub async fn reset_disabled(&self, schedule_id: Uuid) -> Result<Schedule, SchedulingError> {
        self.set_disabled(schedule_id, false).await
    }

    /// Delete a definition and its schedule, stopping the timer first
    #[instrument(skip(self))]
    pub async fn delete_definition(&self, definition_id: Uuid) -> Result<(), SchedulingError> {
        if self.store.find_definition(definition_id).await?.is_none() {
            return Err(SchedulingError::DefinitionNotFound(definition_id));
        }
        if let Some(schedule) = self
            .store
            .find_schedule_for_definition(definition_id)
            .await?
        {
            self.dispatcher.forget(schedule.id);
        }
        self.store.delete_definition(definition_id).await?;
        info!("Deleted recurring definition");
        Ok(())
    }

    async fn load(&self, schedule_id: Uuid) -> Result<Schedule, SchedulingError> {
        self.store
            .find_schedule(schedule_id)
            .await?
            .ok_or(SchedulingError::ScheduleNotFound(schedule_id))
    }
}

fn validate(schedule: &Schedule) -> Result<(), SchedulingError> {
    if schedule.frequency_days == 0 {
        return Err(SchedulingError::InvalidFrequency(schedule.frequency_days));
    }
    if schedule.ends_on.is_some_and(|end| end < schedule.starts_on) {
        return Err(SchedulingError::InvalidWindow);
    }
    Ok(())
}
