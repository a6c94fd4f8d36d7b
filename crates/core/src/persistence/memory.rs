//! In-memory implementation of MaintenanceStore

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::snapshot::Snapshot;
use super::store::*;
use crate::domain::{
    Asset, Part, PurchaseOrder, RecurringDefinition, Request, Schedule, Task, WorkItem, Workflow,
};

/// How many `save_workflows` calls the in-memory store remembers
pub const BULK_SAVE_HISTORY: usize = 64;

/// In-memory implementation of MaintenanceStore
///
/// Used by the worker binary and by tests. Besides holding rows it counts
/// saves per [`RecordKind`] and records the ids of recent bulk workflow
/// saves, so callers can assert how many writes an operation performed.
///
/// # Example
///
/// ```
/// use upkeep_core::InMemoryMaintenanceStore;
///
/// let store = InMemoryMaintenanceStore::new();
/// assert_eq!(store.schedule_count(), 0);
/// ```
pub struct InMemoryMaintenanceStore {
    schedules: RwLock<HashMap<Uuid, Schedule>>,
    definitions: RwLock<HashMap<Uuid, RecurringDefinition>>,
    work_items: RwLock<HashMap<Uuid, WorkItem>>,
    requests: RwLock<HashMap<Uuid, Request>>,
    purchase_orders: RwLock<HashMap<Uuid, PurchaseOrder>>,
    parts: RwLock<HashMap<Uuid, Part>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    assets: RwLock<HashMap<Uuid, Asset>>,
    workflows: RwLock<HashMap<Uuid, Workflow>>,
    save_counts: RwLock<HashMap<RecordKind, usize>>,
    bulk_workflow_saves: RwLock<VecDeque<Vec<Uuid>>>,
    fail_writes: AtomicBool,
    failing_kinds: RwLock<HashSet<RecordKind>>,
}

impl InMemoryMaintenanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            schedules: RwLock::new(HashMap::new()),
            definitions: RwLock::new(HashMap::new()),
            work_items: RwLock::new(HashMap::new()),
            requests: RwLock::new(HashMap::new()),
            purchase_orders: RwLock::new(HashMap::new()),
            parts: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            assets: RwLock::new(HashMap::new()),
            workflows: RwLock::new(HashMap::new()),
            save_counts: RwLock::new(HashMap::new()),
            bulk_workflow_saves: RwLock::new(VecDeque::new()),
            fail_writes: AtomicBool::new(false),
            failing_kinds: RwLock::new(HashSet::new()),
        }
    }

    /// Create a store pre-populated from a snapshot
    ///
    /// Loading does not count towards the save counters.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        fill(&store.schedules, snapshot.schedules, |s| s.id);
        fill(&store.definitions, snapshot.definitions, |d| d.id);
        fill(&store.work_items, snapshot.work_items, |w| w.id);
        fill(&store.requests, snapshot.requests, |r| r.id);
        fill(&store.purchase_orders, snapshot.purchase_orders, |p| p.id);
        fill(&store.parts, snapshot.parts, |p| p.id);
        fill(&store.tasks, snapshot.tasks, |t| t.id);
        fill(&store.assets, snapshot.assets, |a| a.id);
        fill(&store.workflows, snapshot.workflows, |w| w.id);
        store
    }

    /// Dump every row into a snapshot
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            schedules: self.schedules.read().values().cloned().collect(),
            definitions: self.definitions.read().values().cloned().collect(),
            work_items: self.work_items.read().values().cloned().collect(),
            requests: self.requests.read().values().cloned().collect(),
            purchase_orders: self.purchase_orders.read().values().cloned().collect(),
            parts: self.parts.read().values().cloned().collect(),
            tasks: self.tasks.read().values().cloned().collect(),
            assets: self.assets.read().values().cloned().collect(),
            workflows: self.workflows.read().values().cloned().collect(),
        }
    }

    /// Number of saves performed for one kind of row
    pub fn save_count(&self, kind: RecordKind) -> usize {
        self.save_counts.read().get(&kind).copied().unwrap_or(0)
    }

    /// Ids passed to the most recent `save_workflows` calls, oldest first
    ///
    /// Only the last [`BULK_SAVE_HISTORY`] calls are kept.
    pub fn bulk_workflow_saves(&self) -> Vec<Vec<Uuid>> {
        self.bulk_workflow_saves.read().iter().cloned().collect()
    }

    /// Make every subsequent write fail with a database error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes of one kind of row fail with a database error
    /// Fail writes of one record kind only
    pub fn set_fail_writes_for(&self, kind: RecordKind, fail: bool) {
        let mut kinds = self.failing_kinds.write();
        if fail {
            kinds.insert(kind);
        } else {
            kinds.remove(&kind);
        }
    }

    pub fn schedule_count(&self) -> usize {
        self.schedules.read().len()
    }

    pub fn work_item_count(&self) -> usize {
        self.work_items.read().len()
    }

    /// Work items generated by one definition
    pub fn work_items_for_definition(&self, definition_id: Uuid) -> Vec<WorkItem> {
        let mut items: Vec<WorkItem> = self
            .work_items
            .read()
            .values()
            .filter(|w| w.definition_id == Some(definition_id))
            .cloned()
            .collect();
        items.sort_by_key(|w| (w.created_at, w.id));
        items
    }

    fn check_writable(&self, kind: RecordKind) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("writes are disabled".to_string()));
        }
        if self.failing_kinds.read().contains(&kind) {
            return Err(StoreError::Database(format!("writes of {kind} are disabled")));
        }
        Ok(())
    }

    fn record_save(&self, kind: RecordKind, count: usize) {
        *self.save_counts.write().entry(kind).or_insert(0) += count;
    }

    fn put<T: Clone>(
        &self,
        kind: RecordKind,
        map: &RwLock<HashMap<Uuid, T>>,
        id: Uuid,
        value: &T,
    ) -> Result<(), StoreError> {
        self.check_writable(kind)?;
        map.write().insert(id, value.clone());
        self.record_save(kind, 1);
        Ok(())
    }
}

impl Default for InMemoryMaintenanceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn fill<T>(map: &RwLock<HashMap<Uuid, T>>, rows: Vec<T>, id: impl Fn(&T) -> Uuid) {
    let mut map = map.write();
    for row in rows {
        map.insert(id(&row), row);
    }
}

fn get<T: Clone>(map: &RwLock<HashMap<Uuid, T>>, id: Uuid) -> Option<T> {
    map.read().get(&id).cloned()
}

#[async_trait]
impl MaintenanceStore for InMemoryMaintenanceStore {
    async fn find_schedule(&self, id: Uuid) -> Result<Option<Schedule>, StoreError> {
        Ok(get(&self.schedules, id))
    }

    async fn find_schedule_for_definition(
        &self,
        definition_id: Uuid,
    ) -> Result<Option<Schedule>, StoreError> {
        Ok(self
            .schedules
            .read()
            .values()
            .find(|s| s.definition_id == definition_id)
            .cloned())
    }

    async fn save_schedule(&self, schedule: &Schedule) -> Result<(), StoreError> {
        self.put(RecordKind::Schedule, &self.schedules, schedule.id, schedule)
    }

    async fn list_schedules(&self) -> Result<Vec<Schedule>, StoreError> {
        let mut schedules: Vec<Schedule> = self.schedules.read().values().cloned().collect();
        schedules.sort_by_key(|s| s.id);
        Ok(schedules)
    }

    async fn find_definition(&self, id: Uuid) -> Result<Option<RecurringDefinition>, StoreError> {
        Ok(get(&self.definitions, id))
    }

    async fn save_definition(&self, definition: &RecurringDefinition) -> Result<(), StoreError> {
        self.put(
            RecordKind::Definition,
            &self.definitions,
            definition.id,
            definition,
        )
    }

    async fn list_definitions(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<RecurringDefinition>, StoreError> {
        let mut definitions: Vec<RecurringDefinition> = self
            .definitions
            .read()
            .values()
            .filter(|d| d.tenant_id == tenant_id)
            .cloned()
            .collect();
        definitions.sort_by_key(|d| (d.created_at, d.id));
        Ok(definitions)
    }

    async fn delete_definition(&self, id: Uuid) -> Result<(), StoreError> {
        self.check_writable(RecordKind::Definition)?;
        if self.definitions.write().remove(&id).is_none() {
            return Err(StoreError::not_found(RecordKind::Definition, id));
        }
        self.schedules.write().retain(|_, s| s.definition_id != id);
        Ok(())
    }

    async fn find_work_item(&self, id: Uuid) -> Result<Option<WorkItem>, StoreError> {
        Ok(get(&self.work_items, id))
    }

    async fn save_work_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        self.put(RecordKind::WorkItem, &self.work_items, item.id, item)
    }

    async fn recent_work_items_for_definition(
        &self,
        definition_id: Uuid,
        limit: usize,
    ) -> Result<Vec<WorkItem>, StoreError> {
        let mut items = self.work_items_for_definition(definition_id);
        items.reverse();
        items.truncate(limit);
        Ok(items)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(get(&self.tasks, id))
    }

    async fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        self.put(RecordKind::Task, &self.tasks, task.id, task)
    }

    async fn save_generated_work_item(
        &self,
        item: &WorkItem,
        tasks: &[Task],
    ) -> Result<(), StoreError> {
        self.check_writable(RecordKind::WorkItem)?;
        if !tasks.is_empty() {
            self.check_writable(RecordKind::Task)?;
        }
        {
            let mut rows = self.tasks.write();
            for task in tasks {
                rows.insert(task.id, task.clone());
            }
        }
        self.work_items.write().insert(item.id, item.clone());
        self.record_save(RecordKind::Task, tasks.len());
        self.record_save(RecordKind::WorkItem, 1);
        Ok(())
    }

    async fn list_tasks_for_work_item(
        &self,
        work_item_id: Uuid,
    ) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .values()
            .filter(|t| t.work_item_id == work_item_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<Request>, StoreError> {
        Ok(get(&self.requests, id))
    }

    async fn save_request(&self, request: &Request) -> Result<(), StoreError> {
        self.put(RecordKind::Request, &self.requests, request.id, request)
    }

    async fn find_purchase_order(&self, id: Uuid) -> Result<Option<PurchaseOrder>, StoreError> {
        Ok(get(&self.purchase_orders, id))
    }

    async fn save_purchase_order(&self, order: &PurchaseOrder) -> Result<(), StoreError> {
        self.put(
            RecordKind::PurchaseOrder,
            &self.purchase_orders,
            order.id,
            order,
        )
    }

    async fn find_part(&self, id: Uuid) -> Result<Option<Part>, StoreError> {
        Ok(get(&self.parts, id))
    }

    async fn save_part(&self, part: &Part) -> Result<(), StoreError> {
        self.put(RecordKind::Part, &self.parts, part.id, part)
    }

    async fn find_asset(&self, id: Uuid) -> Result<Option<Asset>, StoreError> {
        Ok(get(&self.assets, id))
    }

    async fn save_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        self.put(RecordKind::Asset, &self.assets, asset.id, asset)
    }

    async fn find_workflow(&self, id: Uuid) -> Result<Option<Workflow>, StoreError> {
        Ok(get(&self.workflows, id))
    }

    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), StoreError> {
        self.put(RecordKind::Workflow, &self.workflows, workflow.id, workflow)
    }

    async fn save_workflows(&self, workflows: &[Workflow]) -> Result<(), StoreError> {
        self.check_writable(RecordKind::Workflow)?;
        {
            let mut map = self.workflows.write();
            for workflow in workflows {
                map.insert(workflow.id, workflow.clone());
            }
        }
        self.record_save(RecordKind::Workflow, workflows.len());
        let mut history = self.bulk_workflow_saves.write();
        if history.len() == BULK_SAVE_HISTORY {
            history.pop_front();
        }
        history.push_back(workflows.iter().map(|w| w.id).collect());
        Ok(())
    }

    async fn list_workflows(&self, tenant_id: Uuid) -> Result<Vec<Workflow>, StoreError> {
        let mut workflows: Vec<Workflow> = self
            .workflows
            .read()
            .values()
            .filter(|w| w.tenant_id == tenant_id)
            .cloned()
            .collect();
        workflows.sort_by_key(|w| (w.created_at, w.id));
        Ok(workflows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TriggerKind, WorkItemAction, WorkItemStatus, WorkflowAction};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_save_and_find_schedule() {
        let store = InMemoryMaintenanceStore::new();
        let schedule = Schedule::new(Uuid::now_v7(), Utc::now(), 7);

        store.save_schedule(&schedule).await.unwrap();

        let found = store.find_schedule(schedule.id).await.unwrap();
        assert_eq!(found, Some(schedule.clone()));
        let by_def = store
            .find_schedule_for_definition(schedule.definition_id)
            .await
            .unwrap();
        assert_eq!(by_def.map(|s| s.id), Some(schedule.id));
        assert_eq!(store.save_count(RecordKind::Schedule), 1);
    }

    #[tokio::test]
    async fn test_recent_work_items_newest_first() {
        let store = InMemoryMaintenanceStore::new();
        let tenant = Uuid::now_v7();
        let def_id = Uuid::now_v7();
        let base = Utc::now();

        for i in 0..5 {
            let mut item = WorkItem::new(tenant, format!("run {i}"));
            item.definition_id = Some(def_id);
            item.created_at = base + Duration::days(i);
            store.save_work_item(&item).await.unwrap();
        }
        // Unrelated item
        store
            .save_work_item(&WorkItem::new(tenant, "manual"))
            .await
            .unwrap();

        let recent = store
            .recent_work_items_for_definition(def_id, 3)
            .await
            .unwrap();
        let titles: Vec<_> = recent.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["run 4", "run 3", "run 2"]);
    }

    #[tokio::test]
    async fn test_delete_definition_cascades_to_schedule() {
        let store = InMemoryMaintenanceStore::new();
        let def = RecurringDefinition::new(Uuid::now_v7(), "Filter swap");
        let schedule = Schedule::new(def.id, def.created_at, 30);
        store.save_definition(&def).await.unwrap();
        store.save_schedule(&schedule).await.unwrap();

        store.delete_definition(def.id).await.unwrap();

        assert!(store.find_definition(def.id).await.unwrap().is_none());
        assert!(store.find_schedule(schedule.id).await.unwrap().is_none());

        let err = store.delete_definition(def.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: RecordKind::Definition,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_bulk_workflow_save_is_recorded() {
        let store = InMemoryMaintenanceStore::new();
        let tenant = Uuid::now_v7();
        let workflows: Vec<Workflow> = (0..2)
            .map(|i| {
                Workflow::new(
                    tenant,
                    format!("wf {i}"),
                    TriggerKind::WorkItemCreated,
                    WorkflowAction::WorkItem(WorkItemAction::SendReminder),
                )
            })
            .collect();

        store.save_workflows(&workflows).await.unwrap();

        assert_eq!(store.save_count(RecordKind::Workflow), 2);
        let bulk = store.bulk_workflow_saves();
        assert_eq!(bulk.len(), 1);
        assert_eq!(bulk[0], vec![workflows[0].id, workflows[1].id]);

        let by_trigger = store
            .list_workflows_by_trigger(tenant, TriggerKind::WorkItemCreated)
            .await
            .unwrap();
        assert_eq!(by_trigger.len(), 2);
        let none = store
            .list_workflows_by_trigger(tenant, TriggerKind::PartConsumed)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_save_history_is_capped() {
        let store = InMemoryMaintenanceStore::new();
        let tenant = Uuid::now_v7();
        let mut last = Vec::new();
        for i in 0..BULK_SAVE_HISTORY + 6 {
            let wf = Workflow::new(
                tenant,
                format!("wf {i}"),
                TriggerKind::WorkItemCreated,
                WorkflowAction::WorkItem(WorkItemAction::SendReminder),
            );
            last = vec![wf.id];
            store.save_workflows(&[wf]).await.unwrap();
        }

        let bulk = store.bulk_workflow_saves();
        assert_eq!(bulk.len(), BULK_SAVE_HISTORY);
        assert_eq!(bulk.last(), Some(&last));
        assert_eq!(store.save_count(RecordKind::Workflow), BULK_SAVE_HISTORY + 6);
    }

    #[tokio::test]
    async fn test_generated_item_is_all_or_nothing() {
        let store = InMemoryMaintenanceStore::new();
        let item = WorkItem::new(Uuid::now_v7(), "PM");
        let tasks = vec![
            Task::new(item.tenant_id, item.id, "a"),
            Task::new(item.tenant_id, item.id, "b"),
        ];
        store.set_fail_writes_for(RecordKind::Task, true);

        let err = store
            .save_generated_work_item(&item, &tasks)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(store.work_item_count(), 0);
        assert!(store.list_tasks_for_work_item(item.id).await.unwrap().is_empty());

        store.set_fail_writes_for(RecordKind::Task, false);
        store.save_generated_work_item(&item, &tasks).await.unwrap();
        assert_eq!(store.work_item_count(), 1);
        assert_eq!(store.list_tasks_for_work_item(item.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = InMemoryMaintenanceStore::new();
        store.set_fail_writes(true);

        let item = WorkItem::new(Uuid::now_v7(), "x").with_status(WorkItemStatus::Open);
        let err = store.save_work_item(&item).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(store.work_item_count(), 0);
        assert_eq!(store.save_count(RecordKind::WorkItem), 0);
    }
}
