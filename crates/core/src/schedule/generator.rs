//! Turning a fired occurrence into a work item

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::SchedulingError;
use crate::automation::AutomationEngine;
use crate::clock::Clock;
use crate::domain::{RecurringDefinition, Task, TriggerKind, WorkItem, WorkItemStatus};
use crate::persistence::MaintenanceStore;

/// Creates the work item for one occurrence of a recurring definition
#[async_trait]
pub trait WorkItemGenerator: Send + Sync + 'static {
    async fn generate(
        &self,
        definition: &RecurringDefinition,
        occurs_on: DateTime<Utc>,
    ) -> Result<WorkItem, SchedulingError>;
}

/// Builds work items from the definition's template
///
/// The item is due at the occurrence instant. Every task template becomes a
/// [`Task`] row on the new item, and the item and its tasks are written in a
/// single store call. With an automation engine attached, the item is then
/// raised as a `WorkItemCreated` event and the returned item carries whatever
/// the workflows changed; automation failures are logged and do not undo the
/// item.
pub struct TemplateWorkItemGenerator {
    store: Arc<dyn MaintenanceStore>,
    clock: Arc<dyn Clock>,
    automation: Option<Arc<AutomationEngine>>,
}

impl TemplateWorkItemGenerator {
    pub fn new(store: Arc<dyn MaintenanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            automation: None,
        }
    }

    pub fn with_automation(mut self, engine: Arc<AutomationEngine>) -> Self {
        self.automation = Some(engine);
        self
    }

    fn build(&self, definition: &RecurringDefinition, occurs_on: DateTime<Utc>) -> WorkItem {
        let template = &definition.template;
        let mut item = WorkItem::new(definition.tenant_id, template.title.clone());
        item.description = template.description.clone();
        item.status = WorkItemStatus::Open;
        item.priority = template.priority;
        item.team_id = template.team_id;
        item.assignees = template.assignees.clone();
        item.asset_id = template.asset_id;
        item.location_id = template.location_id;
        item.category_id = template.category_id;
        item.due_date = Some(occurs_on);
        item.definition_id = Some(definition.id);
        item.created_at = self.clock.now();
        item
    }
}

#[async_trait]
impl WorkItemGenerator for TemplateWorkItemGenerator {
    async fn generate(
        &self,
        definition: &RecurringDefinition,
        occurs_on: DateTime<Utc>,
    ) -> Result<WorkItem, SchedulingError> {
        let mut item = self.build(definition, occurs_on);
        let tasks: Vec<Task> = definition
            .tasks
            .iter()
            .map(|template| {
                let mut task = Task::new(definition.tenant_id, item.id, template.label.clone());
                task.created_at = item.created_at;
                task
            })
            .collect();
        self.store.save_generated_work_item(&item, &tasks).await?;
        debug!(
            definition_id = %definition.id,
            work_item_id = %item.id,
            tasks = definition.tasks.len(),
            "Generated work item"
        );

        if let Some(engine) = &self.automation {
            if let Err(e) = engine
                .run_on_work_item(TriggerKind::WorkItemCreated, &mut item)
                .await
            {
                warn!(work_item_id = %item.id, error = %e, "Automation failed for generated work item");
            }
        }
        Ok(item)
    }
}
