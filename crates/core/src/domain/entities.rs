//! Business entities touched by schedules and workflows
//!
//! These are deliberately narrow: each carries the fields that workflow
//! conditions read and workflow actions mutate. Everything else about a work
//! item (attachments, costs, comments, ...) lives in collaborators outside
//! this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority shared by work items and requests
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Work item lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Open,
    InProgress,
    OnHold,
    Complete,
}

impl std::fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in_progress"),
            Self::OnHold => write!(f, "on_hold"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

impl std::str::FromStr for WorkItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "on_hold" => Ok(Self::OnHold),
            "complete" => Ok(Self::Complete),
            other => Err(format!("unknown work item status: {other}")),
        }
    }
}

/// Approval state of a maintenance request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Approval state of a purchase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Rejected,
}

/// Operational status of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Operational,
    Down,
    Standby,
    Modernization,
    InspectionScheduled,
    Decommissioned,
}

/// A unit of maintenance work, either created by hand or generated by a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: WorkItemStatus,
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
    #[serde(default)]
    pub checklist_ids: Vec<Uuid>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Set when the item was generated by a recurring definition
    #[serde(default)]
    pub definition_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// Create an open work item with no assignments
    pub fn new(tenant_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            title: title.into(),
            description: None,
            status: WorkItemStatus::Open,
            priority: Priority::None,
            team_id: None,
            assignees: Vec::new(),
            asset_id: None,
            location_id: None,
            category_id: None,
            checklist_ids: Vec::new(),
            due_date: None,
            definition_id: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_asset(mut self, asset_id: Uuid) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: WorkItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a user to the assignee list, keeping it free of duplicates
    pub fn assign_user(&mut self, user_id: Uuid) {
        if !self.assignees.contains(&user_id) {
            self.assignees.push(user_id);
        }
    }
}

/// A maintenance request raised by a requester, pending approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub status: RequestStatus,
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
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Request {
    pub fn new(tenant_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            title: title.into(),
            status: RequestStatus::Pending,
            priority: Priority::None,
            team_id: None,
            assignees: Vec::new(),
            asset_id: None,
            location_id: None,
            category_id: None,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn assign_user(&mut self, user_id: Uuid) {
        if !self.assignees.contains(&user_id) {
            self.assignees.push(user_id);
        }
    }
}

/// A purchase order for parts or services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub status: PurchaseOrderStatus,
    #[serde(default)]
    pub vendor_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    /// Total cost in minor currency units
    #[serde(default)]
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(tenant_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            name: name.into(),
            status: PurchaseOrderStatus::Pending,
            vendor_id: None,
            category_id: None,
            total_cost: 0.0,
            created_at: Utc::now(),
        }
    }
}

/// A spare part kept in inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub min_quantity: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Part {
    pub fn new(tenant_id: Uuid, name: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            name: name.into(),
            quantity,
            min_quantity: 0.0,
            cost: 0.0,
            category_id: None,
            location_id: None,
            created_at: Utc::now(),
        }
    }
}

/// A checklist step belonging to a work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub work_item_id: Uuid,
    pub label: String,
    /// Free-form value recorded when completing the step (reading, choice, note)
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(tenant_id: Uuid, work_item_id: Uuid, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            work_item_id,
            label: label.into(),
            value: None,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// A maintained piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub status: AssetStatus,
    #[serde(default)]
    pub location_id: Option<Uuid>,
}

impl Asset {
    pub fn new(tenant_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            name: name.into(),
            status: AssetStatus::Operational,
            location_id: None,
        }
    }
}
