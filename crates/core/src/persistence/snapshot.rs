//! JSON snapshot of a store's contents, used to seed the in-memory store

use serde::{Deserialize, Serialize};

use super::store::StoreError;
use crate::domain::{
    Asset, Part, PurchaseOrder, RecurringDefinition, Request, Schedule, Task, WorkItem, Workflow,
};

/// Every row of every kind; missing sections load as empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub schedules: Vec<Schedule>,
    pub definitions: Vec<RecurringDefinition>,
    pub work_items: Vec<WorkItem>,
    pub requests: Vec<Request>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub parts: Vec<Part>,
    pub tasks: Vec<Task>,
    pub assets: Vec<Asset>,
    pub workflows: Vec<Workflow>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
