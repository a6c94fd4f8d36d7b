//! Self-disable check for schedules whose generated work piles up

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{WorkItem, WorkItemStatus};
use crate::persistence::{MaintenanceStore, StoreError};

/// Default number of recent work items inspected
pub const DEFAULT_STALENESS_WINDOW: usize = 10;

/// When a schedule counts as stale
///
/// A schedule is stale when each of the `window` most recent work items its
/// definition generated is still outside `done_statuses`. With fewer than
/// `window` items the schedule is never stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessPolicy {
    pub window: usize,
    pub done_statuses: Vec<WorkItemStatus>,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            window: DEFAULT_STALENESS_WINDOW,
            done_statuses: vec![WorkItemStatus::Complete],
        }
    }
}

impl StalenessPolicy {
    pub fn new(window: usize, done_statuses: Vec<WorkItemStatus>) -> Self {
        Self {
            window,
            done_statuses,
        }
    }

    pub fn is_done(&self, item: &WorkItem) -> bool {
        self.done_statuses.contains(&item.status)
    }

    /// Decide staleness from a definition's most recent work items
    pub fn is_stale_history(&self, recent: &[WorkItem]) -> bool {
        if self.window == 0 || recent.len() < self.window {
            return false;
        }
        recent
            .iter()
            .take(self.window)
            .all(|item| !self.is_done(item))
    }

    /// Load the dispatch history for a definition and decide staleness
    pub async fn is_stale(
        &self,
        store: &dyn MaintenanceStore,
        definition_id: Uuid,
    ) -> Result<bool, StoreError> {
        let recent = store
            .recent_work_items_for_definition(definition_id, self.window)
            .await?;
        let stale = self.is_stale_history(&recent);
        debug!(
            definition_id = %definition_id,
            inspected = recent.len(),
            window = self.window,
            stale,
            "Checked schedule staleness"
        );
        Ok(stale)
    }
}
