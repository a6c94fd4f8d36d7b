//! Workflow action execution
//!
//! The executor interprets a workflow's [`WorkflowAction`] against the subject
//! that triggered it. Each arm reads nothing but the subject (and, for task
//! actions, its linked work item and asset) and writes at most one entity.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::condition::Subject;
use crate::domain::{
    EntityKind, Part, PartAction, PurchaseOrder, PurchaseOrderAction, PurchaseOrderStatus,
    Request, RequestAction, Task, TaskAction, WorkItem, WorkItemAction, Workflow, WorkflowAction,
};
use crate::persistence::{MaintenanceStore, StoreError};

/// A side effect decided here but carried out by a collaborator (mailer, checklist service)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalEffect {
    SendReminder {
        workflow_id: Uuid,
        entity: EntityKind,
        entity_id: Uuid,
    },
    AddChecklist {
        workflow_id: Uuid,
        work_item_id: Uuid,
        checklist_id: Uuid,
    },
}

/// Why an action left everything untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The action targets another entity kind than the subject
    KindMismatch {
        action: EntityKind,
        subject: EntityKind,
    },
    /// Accepted action with no behaviour yet
    Placeholder { action: String },
    /// A link needed to reach the target entity is absent
    MissingLink { link: String },
}

/// Result of applying one workflow action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The subject (or its linked asset) was mutated and persisted
    Applied,
    Delegated(ExternalEffect),
    Skipped(SkipReason),
}

/// Applies workflow actions and persists the result
pub struct ActionExecutor {
    store: Arc<dyn MaintenanceStore>,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn MaintenanceStore>) -> Self {
        Self { store }
    }

    /// Apply `workflow`'s action to `subject`
    ///
    /// The caller must already know the workflow matches. On [`ActionOutcome::Applied`]
    /// `subject` holds the persisted state. Store failures propagate.
    #[instrument(skip_all, fields(workflow_id = %workflow.id, subject_id = %subject.id()))]
    pub async fn apply(
        &self,
        workflow: &Workflow,
        subject: &mut Subject,
    ) -> Result<ActionOutcome, StoreError> {
        let outcome = match (&workflow.action, subject) {
            (WorkflowAction::WorkItem(action), Subject::WorkItem(item)) => {
                self.apply_work_item(workflow.id, action, item).await?
            }
            (WorkflowAction::Request(action), Subject::Request(request)) => {
                self.apply_request(workflow.id, action, request).await?
            }
            (WorkflowAction::PurchaseOrder(action), Subject::PurchaseOrder(order)) => {
                self.apply_purchase_order(workflow.id, action, order)
                    .await?
            }
            (WorkflowAction::Part(action), Subject::Part(part)) => apply_part(action, part),
            (WorkflowAction::Task(action), Subject::Task(task)) => {
                self.apply_task(action, task).await?
            }
            (action, subject) => {
                let reason = SkipReason::KindMismatch {
                    action: action.entity_kind(),
                    subject: subject.kind(),
                };
                debug!(?reason, "Action does not fit subject, skipping");
                ActionOutcome::Skipped(reason)
            }
        };
        Ok(outcome)
    }

    async fn apply_work_item(
        &self,
        workflow_id: Uuid,
        action: &WorkItemAction,
        item: &mut WorkItem,
    ) -> Result<ActionOutcome, StoreError> {
        match action {
            WorkItemAction::AssignTeam { team_id } => item.team_id = Some(*team_id),
            WorkItemAction::AssignUser { user_id } => item.assign_user(*user_id),
            WorkItemAction::AssignAsset { asset_id } => item.asset_id = Some(*asset_id),
            WorkItemAction::AssignCategory { category_id } => {
                item.category_id = Some(*category_id)
            }
            WorkItemAction::AssignLocation { location_id } => {
                item.location_id = Some(*location_id)
            }
            WorkItemAction::AssignPriority { priority } => item.priority = *priority,
            WorkItemAction::AddChecklist { checklist_id } => {
                return Ok(ActionOutcome::Delegated(ExternalEffect::AddChecklist {
                    workflow_id,
                    work_item_id: item.id,
                    checklist_id: *checklist_id,
                }));
            }
            WorkItemAction::SendReminder => {
                return Ok(reminder(workflow_id, EntityKind::WorkItem, item.id));
            }
        }
        self.store.save_work_item(item).await?;
        Ok(ActionOutcome::Applied)
    }

    async fn apply_request(
        &self,
        workflow_id: Uuid,
        action: &RequestAction,
        request: &mut Request,
    ) -> Result<ActionOutcome, StoreError> {
        match action {
            RequestAction::AssignTeam { team_id } => request.team_id = Some(*team_id),
            RequestAction::AssignUser { user_id } => request.assign_user(*user_id),
            RequestAction::AssignAsset { asset_id } => request.asset_id = Some(*asset_id),
            RequestAction::AssignCategory { category_id } => {
                request.category_id = Some(*category_id)
            }
            RequestAction::AssignLocation { location_id } => {
                request.location_id = Some(*location_id)
            }
            RequestAction::AssignPriority { priority } => request.priority = *priority,
            RequestAction::SendReminder => {
                return Ok(reminder(workflow_id, EntityKind::Request, request.id));
            }
        }
        self.store.save_request(request).await?;
        Ok(ActionOutcome::Applied)
    }

    async fn apply_purchase_order(
        &self,
        workflow_id: Uuid,
        action: &PurchaseOrderAction,
        order: &mut PurchaseOrder,
    ) -> Result<ActionOutcome, StoreError> {
        match action {
            PurchaseOrderAction::Approve => order.status = PurchaseOrderStatus::Approved,
            PurchaseOrderAction::Reject => order.status = PurchaseOrderStatus::Rejected,
            PurchaseOrderAction::AssignVendor { vendor_id } => order.vendor_id = Some(*vendor_id),
            PurchaseOrderAction::SendReminder => {
                return Ok(reminder(workflow_id, EntityKind::PurchaseOrder, order.id));
            }
        }
        self.store.save_purchase_order(order).await?;
        Ok(ActionOutcome::Applied)
    }

    async fn apply_task(
        &self,
        action: &TaskAction,
        task: &Task,
    ) -> Result<ActionOutcome, StoreError> {
        let status = match action {
            TaskAction::SetAssetStatus { status } => *status,
            TaskAction::CreateRequest => return Ok(placeholder("create_request")),
            TaskAction::CreateWorkItem => return Ok(placeholder("create_work_item")),
        };

        let Some(item) = self.store.find_work_item(task.work_item_id).await? else {
            return Ok(missing_link(task.id, "work_item"));
        };
        let Some(asset_id) = item.asset_id else {
            return Ok(missing_link(task.id, "asset"));
        };
        let Some(mut asset) = self.store.find_asset(asset_id).await? else {
            return Ok(missing_link(task.id, "asset"));
        };

        asset.status = status;
        self.store.save_asset(&asset).await?;
        debug!(asset_id = %asset.id, ?status, "Set asset status from task");
        Ok(ActionOutcome::Applied)
    }
}

fn apply_part(action: &PartAction, part: &Part) -> ActionOutcome {
    match action {
        PartAction::CreatePurchaseOrder => {
            debug!(part_id = %part.id, "Purchase order creation from parts is not wired, skipping");
            placeholder("create_purchase_order")
        }
    }
}

fn reminder(workflow_id: Uuid, entity: EntityKind, entity_id: Uuid) -> ActionOutcome {
    ActionOutcome::Delegated(ExternalEffect::SendReminder {
        workflow_id,
        entity,
        entity_id,
    })
}

fn placeholder(action: &str) -> ActionOutcome {
    ActionOutcome::Skipped(SkipReason::Placeholder {
        action: action.to_string(),
    })
}

fn missing_link(task_id: Uuid, link: &str) -> ActionOutcome {
    debug!(task_id = %task_id, link, "Task has no linked entity, skipping");
    ActionOutcome::Skipped(SkipReason::MissingLink {
        link: link.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, AssetStatus, Priority, TriggerKind};
    use crate::persistence::{InMemoryMaintenanceStore, RecordKind};

    fn setup() -> (Arc<InMemoryMaintenanceStore>, ActionExecutor) {
        let store = Arc::new(InMemoryMaintenanceStore::new());
        let executor = ActionExecutor::new(store.clone());
        (store, executor)
    }

    fn workflow(trigger: TriggerKind, action: WorkflowAction) -> Workflow {
        Workflow::new(Uuid::now_v7(), "wf", trigger, action)
    }

    #[tokio::test]
    async fn test_assign_priority_persists_once() {
        let (store, executor) = setup();
        let wf = workflow(
            TriggerKind::WorkItemCreated,
            WorkflowAction::WorkItem(WorkItemAction::AssignPriority {
                priority: Priority::High,
            }),
        );
        let mut subject = Subject::WorkItem(WorkItem::new(Uuid::now_v7(), "Inspect pump"));

        let outcome = executor.apply(&wf, &mut subject).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(store.save_count(RecordKind::WorkItem), 1);
        let Subject::WorkItem(item) = subject else {
            panic!("subject kind changed");
        };
        let stored = store.find_work_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_reminder_and_checklist_are_delegated() {
        let (store, executor) = setup();
        let checklist_id = Uuid::now_v7();
        let item = WorkItem::new(Uuid::now_v7(), "Inspect pump");
        let item_id = item.id;
        let mut subject = Subject::WorkItem(item);

        let wf = workflow(
            TriggerKind::WorkItemCreated,
            WorkflowAction::WorkItem(WorkItemAction::AddChecklist { checklist_id }),
        );
        let outcome = executor.apply(&wf, &mut subject).await.unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Delegated(ExternalEffect::AddChecklist {
                workflow_id: wf.id,
                work_item_id: item_id,
                checklist_id,
            })
        );

        let wf = workflow(
            TriggerKind::WorkItemCreated,
            WorkflowAction::WorkItem(WorkItemAction::SendReminder),
        );
        let outcome = executor.apply(&wf, &mut subject).await.unwrap();
        assert!(matches!(
            outcome,
            ActionOutcome::Delegated(ExternalEffect::SendReminder { .. })
        ));
        assert_eq!(store.save_count(RecordKind::WorkItem), 0);
    }

    #[tokio::test]
    async fn test_purchase_order_approve_and_vendor() {
        let (store, executor) = setup();
        let vendor_id = Uuid::now_v7();
        let mut subject = Subject::PurchaseOrder(PurchaseOrder::new(Uuid::now_v7(), "Belts"));

        let approve = workflow(
            TriggerKind::PurchaseOrderCreated,
            WorkflowAction::PurchaseOrder(PurchaseOrderAction::Approve),
        );
        let vendor = workflow(
            TriggerKind::PurchaseOrderCreated,
            WorkflowAction::PurchaseOrder(PurchaseOrderAction::AssignVendor { vendor_id }),
        );
        executor.apply(&approve, &mut subject).await.unwrap();
        executor.apply(&vendor, &mut subject).await.unwrap();

        let Subject::PurchaseOrder(order) = subject else {
            panic!("subject kind changed");
        };
        let stored = store.find_purchase_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PurchaseOrderStatus::Approved);
        assert_eq!(stored.vendor_id, Some(vendor_id));
        assert_eq!(store.save_count(RecordKind::PurchaseOrder), 2);
    }

    #[tokio::test]
    async fn test_request_assignment_persists() {
        let (store, executor) = setup();
        let team_id = Uuid::now_v7();
        let mut subject = Subject::Request(Request::new(Uuid::now_v7(), "Leak in bay 3"));

        let wf = workflow(
            TriggerKind::RequestCreated,
            WorkflowAction::Request(RequestAction::AssignTeam { team_id }),
        );
        let outcome = executor.apply(&wf, &mut subject).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(store.save_count(RecordKind::Request), 1);
    }

    #[tokio::test]
    async fn test_part_placeholder_does_nothing() {
        let (store, executor) = setup();
        let part = Part::new(Uuid::now_v7(), "Filter", 1.0);
        let mut subject = Subject::Part(part.clone());
        let wf = workflow(
            TriggerKind::PartConsumed,
            WorkflowAction::Part(PartAction::CreatePurchaseOrder),
        );

        let outcome = executor.apply(&wf, &mut subject).await.unwrap();

        assert!(matches!(
            outcome,
            ActionOutcome::Skipped(SkipReason::Placeholder { .. })
        ));
        assert_eq!(subject, Subject::Part(part));
        assert_eq!(store.save_count(RecordKind::Part), 0);
        assert_eq!(store.save_count(RecordKind::PurchaseOrder), 0);
    }

    #[tokio::test]
    async fn test_set_asset_status_follows_links() {
        let (store, executor) = setup();
        let tenant = Uuid::now_v7();
        let asset = Asset::new(tenant, "Compressor");
        store.save_asset(&asset).await.unwrap();
        let item = WorkItem::new(tenant, "Compressor PM").with_asset(asset.id);
        store.save_work_item(&item).await.unwrap();
        let mut subject = Subject::Task(Task::new(tenant, item.id, "Check oil"));

        let wf = workflow(
            TriggerKind::TaskCompleted,
            WorkflowAction::Task(TaskAction::SetAssetStatus {
                status: AssetStatus::Down,
            }),
        );
        let outcome = executor.apply(&wf, &mut subject).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Applied);
        let stored = store.find_asset(asset.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssetStatus::Down);
        assert_eq!(store.save_count(RecordKind::Asset), 2);
    }

    #[tokio::test]
    async fn test_set_asset_status_skips_without_asset() {
        let (store, executor) = setup();
        let tenant = Uuid::now_v7();
        let item = WorkItem::new(tenant, "No asset");
        store.save_work_item(&item).await.unwrap();
        let wf = workflow(
            TriggerKind::TaskCompleted,
            WorkflowAction::Task(TaskAction::SetAssetStatus {
                status: AssetStatus::Down,
            }),
        );

        let mut subject = Subject::Task(Task::new(tenant, item.id, "Check oil"));
        let outcome = executor.apply(&wf, &mut subject).await.unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Skipped(SkipReason::MissingLink {
                link: "asset".into()
            })
        );

        // Dangling work item link
        let mut orphan = Subject::Task(Task::new(tenant, Uuid::now_v7(), "Orphan"));
        let outcome = executor.apply(&wf, &mut orphan).await.unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Skipped(SkipReason::MissingLink {
                link: "work_item".into()
            })
        );
        assert_eq!(store.save_count(RecordKind::Asset), 0);
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_skipped() {
        let (store, executor) = setup();
        let wf = workflow(
            TriggerKind::PurchaseOrderCreated,
            WorkflowAction::PurchaseOrder(PurchaseOrderAction::Approve),
        );
        let mut subject = Subject::WorkItem(WorkItem::new(Uuid::now_v7(), "x"));

        let outcome = executor.apply(&wf, &mut subject).await.unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::Skipped(SkipReason::KindMismatch {
                action: EntityKind::PurchaseOrder,
                subject: EntityKind::WorkItem,
            })
        );
        assert_eq!(store.save_count(RecordKind::PurchaseOrder), 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (store, executor) = setup();
        store.set_fail_writes(true);
        let wf = workflow(
            TriggerKind::WorkItemCreated,
            WorkflowAction::WorkItem(WorkItemAction::AssignTeam {
                team_id: Uuid::now_v7(),
            }),
        );
        let mut subject = Subject::WorkItem(WorkItem::new(Uuid::now_v7(), "x"));
        let err = executor.apply(&wf, &mut subject).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
