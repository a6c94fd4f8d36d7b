//! Domain model shared by the scheduler and the automation engine

mod entities;
mod schedule;
mod workflow;

pub use entities::{
    Asset, AssetStatus, Part, Priority, PurchaseOrder, PurchaseOrderStatus, Request,
    RequestStatus, Task, WorkItem, WorkItemStatus,
};
pub use schedule::{CalendarEvent, RecurringDefinition, Schedule, TaskTemplate, WorkItemTemplate};
pub use workflow::{
    Comparator, EntityKind, FieldValue, PartAction, PartField, PurchaseOrderAction,
    PurchaseOrderField, RequestAction, RequestField, TaskAction, TaskField, TriggerKind,
    WorkItemAction, WorkItemField, Workflow, WorkflowAction, WorkflowCondition,
};
