//! Read-only projection of upcoming occurrences

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::recurrence::occurrences_between;
use super::SchedulingError;
use crate::clock::Clock;
use crate::domain::{CalendarEvent, RecurringDefinition};
use crate::persistence::MaintenanceStore;

/// Projects a tenant's recurring definitions onto a time range
pub struct Calendar {
    store: Arc<dyn MaintenanceStore>,
    clock: Arc<dyn Clock>,
}

impl Calendar {
    pub fn new(store: Arc<dyn MaintenanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Occurrences from now until `end_date`, inclusive, ordered by instant
    ///
    /// An `end_date` already in the past yields no events.
    pub async fn project_events(
        &self,
        end_date: DateTime<Utc>,
        tenant_id: Uuid,
    ) -> Result<Vec<CalendarEvent<RecurringDefinition>>, SchedulingError> {
        self.project_between(self.clock.now(), end_date, tenant_id)
            .await
    }

    /// Occurrences inside `[from, to]` for every definition of the tenant
    pub async fn project_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        tenant_id: Uuid,
    ) -> Result<Vec<CalendarEvent<RecurringDefinition>>, SchedulingError> {
        if to < from {
            debug!(%from, %to, "Empty projection window");
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for definition in self.store.list_definitions(tenant_id).await? {
            let Some(schedule) = self.store.find_schedule_for_definition(definition.id).await?
            else {
                debug!(definition_id = %definition.id, "Definition has no schedule");
                continue;
            };
            for occurs_on in occurrences_between(&schedule, from, to) {
                events.push(CalendarEvent::new(definition.clone(), occurs_on));
            }
        }
        events.sort_by_key(|e| (e.occurs_on, e.payload.id));
        Ok(events)
    }
}
