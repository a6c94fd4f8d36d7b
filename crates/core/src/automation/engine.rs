//! Trigger points: run the matching workflows of a tenant for one domain event

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::action::{ActionExecutor, ActionOutcome, ExternalEffect, SkipReason};
use super::condition::{matches, Subject};
use super::AutomationError;
use crate::domain::{
    EntityKind, Part, PurchaseOrder, Request, Task, TriggerKind, WorkItem, Workflow,
};
use crate::persistence::MaintenanceStore;

/// What one event did across the tenant's workflows
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub trigger: TriggerKind,
    pub subject_id: Uuid,
    /// Workflows listening for the trigger
    pub evaluated: usize,
    /// Workflows whose conditions held, in execution order
    pub matched: Vec<Uuid>,
    /// Workflows that mutated and persisted an entity
    pub applied: Vec<Uuid>,
    pub delegated: Vec<ExternalEffect>,
    pub skipped: Vec<(Uuid, SkipReason)>,
}

impl RunReport {
    fn new(trigger: TriggerKind, subject_id: Uuid) -> Self {
        Self {
            trigger,
            subject_id,
            evaluated: 0,
            matched: Vec::new(),
            applied: Vec::new(),
            delegated: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Runs stored workflows when domain events are raised
///
/// Each `run_on_*` call is awaited inline by whoever raised the event.
/// Workflows run in creation order and each sees the subject as left by the
/// previous one.
pub struct AutomationEngine {
    store: Arc<dyn MaintenanceStore>,
    executor: ActionExecutor,
}

impl AutomationEngine {
    pub fn new(store: Arc<dyn MaintenanceStore>) -> Self {
        Self {
            executor: ActionExecutor::new(store.clone()),
            store,
        }
    }

    /// Validate and store a workflow
    pub async fn register_workflow(&self, workflow: &Workflow) -> Result<(), AutomationError> {
        workflow
            .validate()
            .map_err(AutomationError::InvalidWorkflow)?;
        self.store.save_workflow(workflow).await?;
        debug!(workflow_id = %workflow.id, trigger = ?workflow.main_condition, "Registered workflow");
        Ok(())
    }

    /// Run workflows for a work item event; `item` is left as the workflows left it
    pub async fn run_on_work_item(
        &self,
        trigger: TriggerKind,
        item: &mut WorkItem,
    ) -> Result<RunReport, AutomationError> {
        let mut subject = Subject::WorkItem(item.clone());
        let report = self.run(trigger, &mut subject).await?;
        if let Subject::WorkItem(updated) = subject {
            *item = updated;
        }
        Ok(report)
    }

    pub async fn run_on_request(
        &self,
        trigger: TriggerKind,
        request: &mut Request,
    ) -> Result<RunReport, AutomationError> {
        let mut subject = Subject::Request(request.clone());
        let report = self.run(trigger, &mut subject).await?;
        if let Subject::Request(updated) = subject {
            *request = updated;
        }
        Ok(report)
    }

    pub async fn run_on_purchase_order(
        &self,
        trigger: TriggerKind,
        order: &mut PurchaseOrder,
    ) -> Result<RunReport, AutomationError> {
        let mut subject = Subject::PurchaseOrder(order.clone());
        let report = self.run(trigger, &mut subject).await?;
        if let Subject::PurchaseOrder(updated) = subject {
            *order = updated;
        }
        Ok(report)
    }

    pub async fn run_on_part(
        &self,
        trigger: TriggerKind,
        part: &mut Part,
    ) -> Result<RunReport, AutomationError> {
        let mut subject = Subject::Part(part.clone());
        let report = self.run(trigger, &mut subject).await?;
        if let Subject::Part(updated) = subject {
            *part = updated;
        }
        Ok(report)
    }

    pub async fn run_on_task(
        &self,
        trigger: TriggerKind,
        task: &mut Task,
    ) -> Result<RunReport, AutomationError> {
        let mut subject = Subject::Task(task.clone());
        let report = self.run(trigger, &mut subject).await?;
        if let Subject::Task(updated) = subject {
            *task = updated;
        }
        Ok(report)
    }

    /// Evaluate and apply every workflow of the subject's tenant listening for `trigger`
    ///
    /// Mutations are applied to `subject` in place, so the caller sees the
    /// entity as persisted by the last applied action.
    #[instrument(skip(self, subject), fields(subject_id = %subject.id(), tenant_id = %subject.tenant_id()))]
    pub async fn run(
        &self,
        trigger: TriggerKind,
        subject: &mut Subject,
    ) -> Result<RunReport, AutomationError> {
        check_trigger(trigger, subject.kind())?;

        let workflows = self
            .store
            .list_workflows_by_trigger(subject.tenant_id(), trigger)
            .await?;
        let mut report = RunReport::new(trigger, subject.id());
        report.evaluated = workflows.len();

        for workflow in &workflows {
            if !matches(workflow, trigger, subject) {
                debug!(workflow_id = %workflow.id, "Workflow conditions not met");
                continue;
            }
            report.matched.push(workflow.id);

            match self.executor.apply(workflow, subject).await? {
                ActionOutcome::Applied => report.applied.push(workflow.id),
                ActionOutcome::Delegated(effect) => report.delegated.push(effect),
                ActionOutcome::Skipped(reason) => report.skipped.push((workflow.id, reason)),
            }
        }

        if !report.matched.is_empty() {
            info!(
                ?trigger,
                matched = report.matched.len(),
                applied = report.applied.len(),
                delegated = report.delegated.len(),
                "Ran workflows"
            );
        }
        Ok(report)
    }
}

fn check_trigger(trigger: TriggerKind, subject: EntityKind) -> Result<(), AutomationError> {
    if trigger.entity_kind() != subject {
        return Err(AutomationError::TriggerMismatch { trigger, subject });
    }
    Ok(())
}
