//! Plan governance: how many workflows a tenant may keep enabled

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::AutomationError;
use crate::domain::Workflow;
use crate::persistence::MaintenanceStore;

/// Enables and disables a tenant's workflows when its plan changes
pub struct PlanGovernance {
    store: Arc<dyn MaintenanceStore>,
}

impl PlanGovernance {
    pub fn new(store: Arc<dyn MaintenanceStore>) -> Self {
        Self { store }
    }

    /// Keep only the oldest enabled workflow enabled
    ///
    /// Age is `(created_at, id)` ascending. Only rows that flip are persisted,
    /// in a single bulk save, and returned.
    #[instrument(skip(self))]
    pub async fn disable_automations(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Workflow>, AutomationError> {
        let mut workflows = self.store.list_workflows(tenant_id).await?;
        workflows.sort_by_key(|w| (w.created_at, w.id));

        let mut kept = None;
        let mut changed = Vec::new();
        for mut workflow in workflows.into_iter().filter(|w| w.enabled) {
            if kept.is_none() {
                kept = Some(workflow.id);
                continue;
            }
            workflow.enabled = false;
            changed.push(workflow);
        }

        if !changed.is_empty() {
            self.store.save_workflows(&changed).await?;
        }
        info!(
            kept = ?kept,
            disabled = changed.len(),
            "Disabled automations beyond plan limit"
        );
        Ok(changed)
    }

    /// Enable every workflow of the tenant and persist the full set
    #[instrument(skip(self))]
    pub async fn enable_automations(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Workflow>, AutomationError> {
        let mut workflows = self.store.list_workflows(tenant_id).await?;
        workflows.sort_by_key(|w| (w.created_at, w.id));
        for workflow in &mut workflows {
            workflow.enabled = true;
        }

        if !workflows.is_empty() {
            self.store.save_workflows(&workflows).await?;
        }
        info!(enabled = workflows.len(), "Enabled all automations");
        Ok(workflows)
    }

    /// Explicitly toggle one workflow
    #[instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        workflow_id: Uuid,
        enabled: bool,
    ) -> Result<Workflow, AutomationError> {
        let mut workflow = self
            .store
            .find_workflow(workflow_id)
            .await?
            .ok_or(AutomationError::WorkflowNotFound(workflow_id))?;
        if workflow.enabled != enabled {
            workflow.enabled = enabled;
            self.store.save_workflow(&workflow).await?;
        }
        Ok(workflow)
    }

    pub async fn enabled_count(&self, tenant_id: Uuid) -> Result<usize, AutomationError> {
        let workflows = self.store.list_workflows(tenant_id).await?;
        Ok(workflows.iter().filter(|w| w.enabled).count())
    }
}
