//! MaintenanceStore trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Asset, Part, PurchaseOrder, RecurringDefinition, Request, Schedule, Task, TriggerKind,
    WorkItem, Workflow,
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row not found where one was required
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }
}

/// Kinds of rows the store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Schedule,
    Definition,
    WorkItem,
    Request,
    PurchaseOrder,
    Part,
    Task,
    Asset,
    Workflow,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule => write!(f, "schedule"),
            Self::Definition => write!(f, "recurring definition"),
            Self::WorkItem => write!(f, "work item"),
            Self::Request => write!(f, "request"),
            Self::PurchaseOrder => write!(f, "purchase order"),
            Self::Part => write!(f, "part"),
            Self::Task => write!(f, "task"),
            Self::Asset => write!(f, "asset"),
            Self::Workflow => write!(f, "workflow"),
        }
    }
}

/// Persistence boundary for schedules, entities and workflows
///
/// Implementations must be read-your-writes: a `find_*` issued after a
/// `save_*` returns the saved row. `find_*` returns `Ok(None)` for a missing
/// row; callers decide whether absence is an error.
#[async_trait]
pub trait MaintenanceStore: Send + Sync + 'static {
    // =========================================================================
    // Schedules and recurring definitions
    // =========================================================================

    async fn find_schedule(&self, id: Uuid) -> Result<Option<Schedule>, StoreError>;

    async fn find_schedule_for_definition(
        &self,
        definition_id: Uuid,
    ) -> Result<Option<Schedule>, StoreError>;

    async fn save_schedule(&self, schedule: &Schedule) -> Result<(), StoreError>;

    /// Every persisted schedule, in any state
    async fn list_schedules(&self) -> Result<Vec<Schedule>, StoreError>;

    async fn find_definition(&self, id: Uuid) -> Result<Option<RecurringDefinition>, StoreError>;

    async fn save_definition(&self, definition: &RecurringDefinition) -> Result<(), StoreError>;

    /// Definitions of one tenant, oldest first
    async fn list_definitions(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<RecurringDefinition>, StoreError>;

    /// Remove a definition together with its schedule
    async fn delete_definition(&self, id: Uuid) -> Result<(), StoreError>;

    // =========================================================================
    // Work items and their tasks
    // =========================================================================

    async fn find_work_item(&self, id: Uuid) -> Result<Option<WorkItem>, StoreError>;

    async fn save_work_item(&self, item: &WorkItem) -> Result<(), StoreError>;

    /// The `limit` most recently created work items generated by a definition,
    /// newest first
    async fn recent_work_items_for_definition(
        &self,
        definition_id: Uuid,
        limit: usize,
    ) -> Result<Vec<WorkItem>, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn save_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Persist a freshly generated work item together with its tasks
    ///
    /// Either every row lands or the item does not. The default writes the
    /// tasks first and the item last, so a failure leaves no visible work
    /// item for the definition; transactional backends should override it.
    async fn save_generated_work_item(
        &self,
        item: &WorkItem,
        tasks: &[Task],
    ) -> Result<(), StoreError> {
        for task in tasks {
            self.save_task(task).await?;
        }
        self.save_work_item(item).await
    }

    async fn list_tasks_for_work_item(&self, work_item_id: Uuid)
        -> Result<Vec<Task>, StoreError>;

    // =========================================================================
    // Requests, purchase orders, parts, assets
    // =========================================================================

    async fn find_request(&self, id: Uuid) -> Result<Option<Request>, StoreError>;

    async fn save_request(&self, request: &Request) -> Result<(), StoreError>;

    async fn find_purchase_order(&self, id: Uuid) -> Result<Option<PurchaseOrder>, StoreError>;

    async fn save_purchase_order(&self, order: &PurchaseOrder) -> Result<(), StoreError>;

    async fn find_part(&self, id: Uuid) -> Result<Option<Part>, StoreError>;

    async fn save_part(&self, part: &Part) -> Result<(), StoreError>;

    async fn find_asset(&self, id: Uuid) -> Result<Option<Asset>, StoreError>;

    async fn save_asset(&self, asset: &Asset) -> Result<(), StoreError>;

    // =========================================================================
    // Workflows
    // =========================================================================

    async fn find_workflow(&self, id: Uuid) -> Result<Option<Workflow>, StoreError>;

    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), StoreError>;

    /// Persist several workflows in one call
    async fn save_workflows(&self, workflows: &[Workflow]) -> Result<(), StoreError>;

    /// Workflows of one tenant ordered by `(created_at, id)`
    async fn list_workflows(&self, tenant_id: Uuid) -> Result<Vec<Workflow>, StoreError>;

    /// Workflows of one tenant reacting to `trigger`, ordered by `(created_at, id)`
    async fn list_workflows_by_trigger(
        &self,
        tenant_id: Uuid,
        trigger: TriggerKind,
    ) -> Result<Vec<Workflow>, StoreError> {
        let workflows = self.list_workflows(tenant_id).await?;
        Ok(workflows
            .into_iter()
            .filter(|w| w.main_condition == trigger)
            .collect())
    }
}
