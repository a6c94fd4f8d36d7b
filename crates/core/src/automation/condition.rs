//! Workflow condition evaluation
//!
//! [`matches`] is the single entry point: it gates on `enabled` and the trigger
//! kind, then ANDs the secondary conditions. Each condition is interpreted by
//! reading one field off the [`Subject`] and applying its [`Comparator`].

use uuid::Uuid;

use crate::domain::{
    Comparator, EntityKind, FieldValue, Part, PartField, PurchaseOrder, PurchaseOrderField,
    Request, RequestField, Task, TaskField, TriggerKind, WorkItem, WorkItemField, Workflow,
    WorkflowCondition,
};

/// The entity a domain event carries
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    WorkItem(WorkItem),
    Request(Request),
    PurchaseOrder(PurchaseOrder),
    Part(Part),
    Task(Task),
}

impl Subject {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::WorkItem(_) => EntityKind::WorkItem,
            Self::Request(_) => EntityKind::Request,
            Self::PurchaseOrder(_) => EntityKind::PurchaseOrder,
            Self::Part(_) => EntityKind::Part,
            Self::Task(_) => EntityKind::Task,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::WorkItem(w) => w.id,
            Self::Request(r) => r.id,
            Self::PurchaseOrder(p) => p.id,
            Self::Part(p) => p.id,
            Self::Task(t) => t.id,
        }
    }

    pub fn tenant_id(&self) -> Uuid {
        match self {
            Self::WorkItem(w) => w.tenant_id,
            Self::Request(r) => r.tenant_id,
            Self::PurchaseOrder(p) => p.tenant_id,
            Self::Part(p) => p.tenant_id,
            Self::Task(t) => t.tenant_id,
        }
    }
}

/// Whether `workflow` applies to `subject` for the event `trigger`
///
/// Disabled workflows and workflows listening for another trigger are
/// rejected before any secondary condition is looked at.
pub fn matches(workflow: &Workflow, trigger: TriggerKind, subject: &Subject) -> bool {
    if !workflow.enabled || workflow.main_condition != trigger {
        return false;
    }
    workflow
        .secondary_conditions
        .iter()
        .all(|condition| evaluate(condition, subject))
}

/// Evaluate one secondary condition; a condition about another entity kind is false
pub fn evaluate(condition: &WorkflowCondition, subject: &Subject) -> bool {
    let readings = match (condition, subject) {
        (WorkflowCondition::WorkItem { field, .. }, Subject::WorkItem(item)) => {
            read_work_item(*field, item)
        }
        (WorkflowCondition::Request { field, .. }, Subject::Request(request)) => {
            read_request(*field, request)
        }
        (WorkflowCondition::PurchaseOrder { field, .. }, Subject::PurchaseOrder(order)) => {
            read_purchase_order(*field, order)
        }
        (WorkflowCondition::Part { field, .. }, Subject::Part(part)) => read_part(*field, part),
        (WorkflowCondition::Task { field, .. }, Subject::Task(task)) => read_task(*field, task),
        _ => return false,
    };
    compare(comparator_of(condition), &readings)
}

fn comparator_of(condition: &WorkflowCondition) -> &Comparator {
    match condition {
        WorkflowCondition::WorkItem { comparator, .. }
        | WorkflowCondition::Request { comparator, .. }
        | WorkflowCondition::PurchaseOrder { comparator, .. }
        | WorkflowCondition::Part { comparator, .. }
        | WorkflowCondition::Task { comparator, .. } => comparator,
    }
}

/// Apply a comparator to a field's readings
///
/// An unset field reads as no values; a multi-valued field (assignees) matches
/// when any of its values does. `NotEquals` is the negation of `Equals`, so it
/// holds for an unset field.
pub fn compare(comparator: &Comparator, readings: &[FieldValue]) -> bool {
    match comparator {
        Comparator::IsSet => !readings.is_empty(),
        Comparator::IsUnset => readings.is_empty(),
        Comparator::Equals(expected) => readings.contains(expected),
        Comparator::NotEquals(expected) => !readings.contains(expected),
        Comparator::OneOf(options) => readings.iter().any(|v| options.contains(v)),
        Comparator::Between { min, max } => readings.iter().any(|v| {
            matches!(
                v.compare(min),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ) && matches!(
                v.compare(max),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            )
        }),
        Comparator::Below(bound) => readings
            .iter()
            .any(|v| v.compare(bound) == Some(std::cmp::Ordering::Less)),
        Comparator::Above(bound) => readings
            .iter()
            .any(|v| v.compare(bound) == Some(std::cmp::Ordering::Greater)),
    }
}

fn id(value: Option<Uuid>) -> Vec<FieldValue> {
    value.map(FieldValue::Id).into_iter().collect()
}

fn read_work_item(field: WorkItemField, item: &WorkItem) -> Vec<FieldValue> {
    match field {
        WorkItemField::Priority => vec![FieldValue::Priority(item.priority)],
        WorkItemField::Status => vec![FieldValue::WorkItemStatus(item.status)],
        WorkItemField::Team => id(item.team_id),
        WorkItemField::Assignee => item.assignees.iter().copied().map(FieldValue::Id).collect(),
        WorkItemField::Asset => id(item.asset_id),
        WorkItemField::Location => id(item.location_id),
        WorkItemField::Category => id(item.category_id),
        WorkItemField::DueDate => item.due_date.map(FieldValue::Date).into_iter().collect(),
        WorkItemField::CreatedAt => vec![FieldValue::Date(item.created_at)],
        WorkItemField::Title => vec![FieldValue::Text(item.title.clone())],
    }
}

fn read_request(field: RequestField, request: &Request) -> Vec<FieldValue> {
    match field {
        RequestField::Priority => vec![FieldValue::Priority(request.priority)],
        RequestField::Status => vec![FieldValue::RequestStatus(request.status)],
        RequestField::Team => id(request.team_id),
        RequestField::Assignee => request
            .assignees
            .iter()
            .copied()
            .map(FieldValue::Id)
            .collect(),
        RequestField::Asset => id(request.asset_id),
        RequestField::Location => id(request.location_id),
        RequestField::Category => id(request.category_id),
        RequestField::DueDate => request.due_date.map(FieldValue::Date).into_iter().collect(),
        RequestField::CreatedAt => vec![FieldValue::Date(request.created_at)],
        RequestField::Title => vec![FieldValue::Text(request.title.clone())],
    }
}

fn read_purchase_order(field: PurchaseOrderField, order: &PurchaseOrder) -> Vec<FieldValue> {
    match field {
        PurchaseOrderField::Status => vec![FieldValue::PurchaseOrderStatus(order.status)],
        PurchaseOrderField::Vendor => id(order.vendor_id),
        PurchaseOrderField::Category => id(order.category_id),
        PurchaseOrderField::TotalCost => vec![FieldValue::Number(order.total_cost)],
        PurchaseOrderField::CreatedAt => vec![FieldValue::Date(order.created_at)],
    }
}

fn read_part(field: PartField, part: &Part) -> Vec<FieldValue> {
    match field {
        PartField::Quantity => vec![FieldValue::Number(part.quantity)],
        PartField::MinQuantity => vec![FieldValue::Number(part.min_quantity)],
        PartField::Cost => vec![FieldValue::Number(part.cost)],
        PartField::Category => id(part.category_id),
        PartField::Location => id(part.location_id),
    }
}

fn read_task(field: TaskField, task: &Task) -> Vec<FieldValue> {
    match field {
        TaskField::Label => vec![FieldValue::Text(task.label.clone())],
        TaskField::Value => task.value.clone().map(FieldValue::Text).into_iter().collect(),
        TaskField::Completed => vec![FieldValue::Bool(task.completed)],
    }
}
