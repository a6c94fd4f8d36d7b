//! Workflow rules: trigger, secondary conditions and one action
//!
//! The vocabularies here are closed. A workflow is stored data, and everything
//! it can express is enumerated below; there is no rule language.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::{AssetStatus, Priority, PurchaseOrderStatus, RequestStatus, WorkItemStatus};

/// The five business-entity kinds workflows react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    WorkItem,
    Request,
    PurchaseOrder,
    Part,
    Task,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkItem => write!(f, "work_item"),
            Self::Request => write!(f, "request"),
            Self::PurchaseOrder => write!(f, "purchase_order"),
            Self::Part => write!(f, "part"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Domain event a workflow reacts to (its main condition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    WorkItemCreated,
    WorkItemClosed,
    WorkItemArchived,
    RequestCreated,
    RequestApproved,
    RequestRejected,
    PurchaseOrderCreated,
    PurchaseOrderUpdated,
    PartUpdated,
    PartConsumed,
    TaskCompleted,
}

impl TriggerKind {
    /// Entity kind the triggering event carries
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::WorkItemCreated | Self::WorkItemClosed | Self::WorkItemArchived => {
                EntityKind::WorkItem
            }
            Self::RequestCreated | Self::RequestApproved | Self::RequestRejected => {
                EntityKind::Request
            }
            Self::PurchaseOrderCreated | Self::PurchaseOrderUpdated => EntityKind::PurchaseOrder,
            Self::PartUpdated | Self::PartConsumed => EntityKind::Part,
            Self::TaskCompleted => EntityKind::Task,
        }
    }
}

/// A value a field is compared against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Id(Uuid),
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Bool(bool),
    Priority(Priority),
    WorkItemStatus(WorkItemStatus),
    RequestStatus(RequestStatus),
    PurchaseOrderStatus(PurchaseOrderStatus),
}

impl FieldValue {
    /// Order two values of the same variant; `None` when they are not comparable
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Priority(a), Self::Priority(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// How a field value is tested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Comparator {
    Equals(FieldValue),
    NotEquals(FieldValue),
    OneOf(Vec<FieldValue>),
    /// Inclusive on both ends
    Between {
        min: FieldValue,
        max: FieldValue,
    },
    Below(FieldValue),
    Above(FieldValue),
    IsSet,
    IsUnset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemField {
    Priority,
    Status,
    Team,
    Assignee,
    Asset,
    Location,
    Category,
    DueDate,
    CreatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestField {
    Priority,
    Status,
    Team,
    Assignee,
    Asset,
    Location,
    Category,
    DueDate,
    CreatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderField {
    Status,
    Vendor,
    Category,
    TotalCost,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartField {
    Quantity,
    MinQuantity,
    Cost,
    Category,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Label,
    Value,
    Completed,
}

/// One secondary condition: a field of one entity kind plus a comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum WorkflowCondition {
    WorkItem {
        field: WorkItemField,
        comparator: Comparator,
    },
    Request {
        field: RequestField,
        comparator: Comparator,
    },
    PurchaseOrder {
        field: PurchaseOrderField,
        comparator: Comparator,
    },
    Part {
        field: PartField,
        comparator: Comparator,
    },
    Task {
        field: TaskField,
        comparator: Comparator,
    },
}

impl WorkflowCondition {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::WorkItem { .. } => EntityKind::WorkItem,
            Self::Request { .. } => EntityKind::Request,
            Self::PurchaseOrder { .. } => EntityKind::PurchaseOrder,
            Self::Part { .. } => EntityKind::Part,
            Self::Task { .. } => EntityKind::Task,
        }
    }
}

/// Actions on a work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkItemAction {
    AssignTeam { team_id: Uuid },
    AssignUser { user_id: Uuid },
    AssignAsset { asset_id: Uuid },
    AssignCategory { category_id: Uuid },
    AssignLocation { location_id: Uuid },
    AssignPriority { priority: Priority },
    AddChecklist { checklist_id: Uuid },
    SendReminder,
}

/// Actions on a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestAction {
    AssignTeam { team_id: Uuid },
    AssignUser { user_id: Uuid },
    AssignAsset { asset_id: Uuid },
    AssignCategory { category_id: Uuid },
    AssignLocation { location_id: Uuid },
    AssignPriority { priority: Priority },
    SendReminder,
}

/// Actions on a purchase order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseOrderAction {
    Approve,
    Reject,
    AssignVendor { vendor_id: Uuid },
    SendReminder,
}

/// Actions on a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartAction {
    /// Accepted but not carried out yet
    CreatePurchaseOrder,
}

/// Actions on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskAction {
    /// Set the status of the asset attached to the task's work item
    SetAssetStatus { status: AssetStatus },
    /// Accepted but not carried out yet
    CreateRequest,
    /// Accepted but not carried out yet
    CreateWorkItem,
}

/// The single mutation a workflow applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "action", rename_all = "snake_case")]
pub enum WorkflowAction {
    WorkItem(WorkItemAction),
    Request(RequestAction),
    PurchaseOrder(PurchaseOrderAction),
    Part(PartAction),
    Task(TaskAction),
}

impl WorkflowAction {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::WorkItem(_) => EntityKind::WorkItem,
            Self::Request(_) => EntityKind::Request,
            Self::PurchaseOrder(_) => EntityKind::PurchaseOrder,
            Self::Part(_) => EntityKind::Part,
            Self::Task(_) => EntityKind::Task,
        }
    }
}

/// A stored automation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub main_condition: TriggerKind,
    #[serde(default)]
    pub secondary_conditions: Vec<WorkflowCondition>,
    pub action: WorkflowAction,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    /// Create an enabled workflow with no secondary conditions
    pub fn new(
        tenant_id: Uuid,
        title: impl Into<String>,
        main_condition: TriggerKind,
        action: WorkflowAction,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            title: title.into(),
            main_condition,
            secondary_conditions: Vec::new(),
            action,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_condition(mut self, condition: WorkflowCondition) -> Self {
        self.secondary_conditions.push(condition);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check that the action targets the entity kind the trigger carries
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.main_condition.entity_kind();
        let actual = self.action.entity_kind();
        if expected != actual {
            return Err(format!(
                "action targets {actual} but trigger {:?} carries {expected}",
                self.main_condition
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_entity_kinds() {
        assert_eq!(
            TriggerKind::WorkItemArchived.entity_kind(),
            EntityKind::WorkItem
        );
        assert_eq!(TriggerKind::RequestRejected.entity_kind(), EntityKind::Request);
        assert_eq!(
            TriggerKind::PurchaseOrderUpdated.entity_kind(),
            EntityKind::PurchaseOrder
        );
        assert_eq!(TriggerKind::PartConsumed.entity_kind(), EntityKind::Part);
        assert_eq!(TriggerKind::TaskCompleted.entity_kind(), EntityKind::Task);
    }

    #[test]
    fn test_validate_rejects_mismatched_action() {
        let workflow = Workflow::new(
            Uuid::now_v7(),
            "Approve cheap orders",
            TriggerKind::WorkItemCreated,
            WorkflowAction::PurchaseOrder(PurchaseOrderAction::Approve),
        );
        let err = workflow.validate().unwrap_err();
        assert!(err.contains("purchase_order"));

        let ok = Workflow::new(
            Uuid::now_v7(),
            "Approve cheap orders",
            TriggerKind::PurchaseOrderCreated,
            WorkflowAction::PurchaseOrder(PurchaseOrderAction::Approve),
        );
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_field_value_ordering() {
        assert_eq!(
            FieldValue::Number(1.0).compare(&FieldValue::Number(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FieldValue::Priority(Priority::High).compare(&FieldValue::Priority(Priority::Low)),
            Some(Ordering::Greater)
        );
        assert_eq!(FieldValue::Number(1.0).compare(&FieldValue::Bool(true)), None);
    }

    #[test]
    fn test_workflow_serialization() {
        let workflow = Workflow::new(
            Uuid::now_v7(),
            "Escalate urgent",
            TriggerKind::WorkItemCreated,
            WorkflowAction::WorkItem(WorkItemAction::AssignPriority {
                priority: Priority::High,
            }),
        )
        .with_condition(WorkflowCondition::WorkItem {
            field: WorkItemField::Asset,
            comparator: Comparator::IsSet,
        });

        let json = serde_json::to_value(&workflow).unwrap();
        assert_eq!(json["main_condition"], "work_item_created");
        assert_eq!(json["action"]["entity"], "work_item");
        assert_eq!(json["action"]["action"]["type"], "assign_priority");
        assert_eq!(json["secondary_conditions"][0]["entity"], "work_item");

        let back: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(back, workflow);
    }
}
