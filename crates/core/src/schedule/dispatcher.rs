//! Per-schedule one-shot timers that generate work items
//!
//! The dispatcher owns a registry keyed by schedule id. Each entry carries a
//! generation number: a timer task only acts while the registry still holds
//! its generation, so a fire racing a `stop` or `reschedule` resolves to a
//! single outcome. An entry is `Armed` while its task sleeps and `Firing` once
//! the task has claimed it; firing tasks are never aborted.
//!
//! The registry also remembers the last occurrence claimed per schedule. That
//! record outlives `stop` and `reschedule`, and arming never targets an
//! instant at or before it, so an occurrence is generated at most once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::generator::WorkItemGenerator;
use super::recurrence::{next_after, next_on_or_after};
use super::staleness::StalenessPolicy;
use super::SchedulingError;
use crate::clock::Clock;
use crate::domain::Schedule;
use crate::persistence::MaintenanceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Armed,
    Firing,
}

struct TimerEntry {
    generation: u64,
    state: TimerState,
    due: DateTime<Utc>,
    handle: AbortHandle,
}

impl TimerEntry {
    /// Cancel the pending task unless it is already firing
    fn cancel(&self) {
        if self.state == TimerState::Armed {
            self.handle.abort();
        }
    }
}

#[derive(Default)]
struct Registry {
    timers: HashMap<Uuid, TimerEntry>,
    claimed: HashMap<Uuid, DateTime<Utc>>,
}

impl Registry {
    /// Remove and cancel the entry; returns whether one existed
    fn remove(&mut self, schedule_id: Uuid) -> bool {
        match self.timers.remove(&schedule_id) {
            Some(entry) => {
                entry.cancel();
                true
            }
            None => false,
        }
    }

    /// First occurrence from `now` that was not already claimed
    fn next_unclaimed(&self, schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let due = next_on_or_after(schedule, now)?;
        match self.claimed.get(&schedule.id) {
            Some(last) if due <= *last => next_after(schedule, *last),
            _ => Some(due),
        }
    }
}

struct DispatcherInner {
    store: Arc<dyn MaintenanceStore>,
    generator: Arc<dyn WorkItemGenerator>,
    clock: Arc<dyn Clock>,
    policy: StalenessPolicy,
    registry: Mutex<Registry>,
    generations: AtomicU64,
}

/// Arms, re-arms and stops schedule timers
///
/// Cloning is cheap and clones share one registry.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn MaintenanceStore>,
        generator: Arc<dyn WorkItemGenerator>,
        clock: Arc<dyn Clock>,
        policy: StalenessPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                store,
                generator,
                clock,
                policy,
                registry: Mutex::new(Registry::default()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Arm the timer for the schedule's next occurrence
    ///
    /// Returns the instant armed for, or `None` when the schedule is disabled,
    /// ended, stale (it is disabled and persisted) or has no further occurrence.
    #[instrument(skip(self, schedule), fields(schedule_id = %schedule.id))]
    pub async fn schedule_next(
        &self,
        schedule: &Schedule,
    ) -> Result<Option<DateTime<Utc>>, SchedulingError> {
        let now = self.inner.clock.now();
        if schedule.is_terminal(now) {
            debug!(disabled = schedule.disabled, "Schedule is terminal, not arming");
            self.inner.registry.lock().remove(schedule.id);
            return Ok(None);
        }

        if self.inner.disable_if_stale(schedule).await? {
            self.inner.registry.lock().remove(schedule.id);
            return Ok(None);
        }

        let mut registry = self.inner.registry.lock();
        match registry.next_unclaimed(schedule, now) {
            Some(due) => {
                self.inner.arm_locked(&mut registry, schedule.id, due);
                Ok(Some(due))
            }
            None => {
                debug!("Schedule has no further occurrence");
                registry.remove(schedule.id);
                Ok(None)
            }
        }
    }

    /// Load a schedule and arm it
    pub async fn schedule_next_by_id(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, SchedulingError> {
        let schedule = self
            .inner
            .store
            .find_schedule(schedule_id)
            .await?
            .ok_or(SchedulingError::ScheduleNotFound(schedule_id))?;
        self.schedule_next(&schedule).await
    }

    /// Cancel and forget any timer for the schedule; idempotent
    pub fn stop(&self, schedule_id: Uuid) {
        if self.inner.registry.lock().remove(schedule_id) {
            debug!(schedule_id = %schedule_id, "Stopped schedule timer");
        }
    }

    /// Stop the timer and drop the claimed-occurrence record for a schedule
    /// that is being deleted
    pub fn forget(&self, schedule_id: Uuid) {
        let mut registry = self.inner.registry.lock();
        registry.remove(schedule_id);
        registry.claimed.remove(&schedule_id);
    }

    /// Stop the timer for `schedule_id`, then arm with the new parameters
    ///
    /// An occurrence already claimed by a firing timer is not armed again.
    pub async fn reschedule(
        &self,
        schedule_id: Uuid,
        schedule: &Schedule,
    ) -> Result<Option<DateTime<Utc>>, SchedulingError> {
        self.stop(schedule_id);
        self.schedule_next(schedule).await
    }

    /// Re-arm every persisted schedule; returns how many timers were armed
    ///
    /// A schedule that fails to arm is logged and skipped.
    #[instrument(skip(self))]
    pub async fn restore_all(&self) -> Result<usize, SchedulingError> {
        let schedules = self.inner.store.list_schedules().await?;
        let total = schedules.len();
        let mut armed = 0;
        for schedule in &schedules {
            match self.schedule_next(schedule).await {
                Ok(Some(_)) => armed += 1,
                Ok(None) => {}
                Err(e) => {
                    error!(schedule_id = %schedule.id, error = %e, "Failed to restore schedule")
                }
            }
        }
        info!(total, armed, "Restored schedule timers");
        Ok(armed)
    }

    /// Number of schedules with a live timer
    pub fn armed_count(&self) -> usize {
        self.inner.registry.lock().timers.len()
    }

    pub fn is_armed(&self, schedule_id: Uuid) -> bool {
        self.inner.registry.lock().timers.contains_key(&schedule_id)
    }

    /// Instant the live timer for the schedule fires at
    pub fn next_due(&self, schedule_id: Uuid) -> Option<DateTime<Utc>> {
        self.inner
            .registry
            .lock()
            .timers
            .get(&schedule_id)
            .map(|e| e.due)
    }

    /// Cancel every pending timer; timers already firing finish but do not re-arm
    pub fn shutdown(&self) {
        let entries: Vec<TimerEntry> = {
            let mut registry = self.inner.registry.lock();
            registry.timers.drain().map(|(_, entry)| entry).collect()
        };
        for entry in &entries {
            entry.cancel();
        }
        info!(cancelled = entries.len(), "Dispatcher shut down");
    }
}

impl DispatcherInner {
    /// Replace any entry for `schedule_id` with a fresh timer due at `due`
    fn arm_locked(self: &Arc<Self>, registry: &mut Registry, schedule_id: Uuid, due: DateTime<Utc>) {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = (due - self.clock.now()).to_std().unwrap_or_default();

        if let Some(previous) = registry.timers.get(&schedule_id) {
            previous.cancel();
        }

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.on_fire(schedule_id, generation, due).await;
        })
        .abort_handle();

        registry.timers.insert(
            schedule_id,
            TimerEntry {
                generation,
                state: TimerState::Armed,
                due,
                handle,
            },
        );
        debug!(schedule_id = %schedule_id, generation, %due, "Armed schedule timer");
    }

    fn is_current(&self, schedule_id: Uuid, generation: u64) -> bool {
        self.registry
            .lock()
            .timers
            .get(&schedule_id)
            .is_some_and(|e| e.generation == generation)
    }

    /// Mark the entry as firing and record `due` as claimed, if the entry
    /// still belongs to this timer
    fn claim(&self, schedule_id: Uuid, generation: u64, due: DateTime<Utc>) -> bool {
        let mut registry = self.registry.lock();
        match registry.timers.get_mut(&schedule_id) {
            Some(entry) if entry.generation == generation => {
                entry.state = TimerState::Firing;
            }
            _ => return false,
        }
        let last = registry.claimed.entry(schedule_id).or_insert(due);
        if *last < due {
            *last = due;
        }
        true
    }

    /// Disable and persist the schedule if its backlog is stale
    async fn disable_if_stale(&self, schedule: &Schedule) -> Result<bool, SchedulingError> {
        if !self
            .policy
            .is_stale(self.store.as_ref(), schedule.definition_id)
            .await?
        {
            return Ok(false);
        }
        let mut disabled = schedule.clone();
        disabled.disabled = true;
        self.store.save_schedule(&disabled).await?;
        info!(
            schedule_id = %schedule.id,
            definition_id = %schedule.definition_id,
            window = self.policy.window,
            "Disabled stale schedule"
        );
        Ok(true)
    }

    async fn on_fire(self: Arc<Self>, schedule_id: Uuid, generation: u64, due: DateTime<Utc>) {
        if !self.claim(schedule_id, generation, due) {
            debug!(schedule_id = %schedule_id, generation, "Timer superseded before firing");
            return;
        }

        let next = match self.fire(schedule_id, generation, due).await {
            Ok(next) => next,
            Err(e) => {
                error!(schedule_id = %schedule_id, error = %e, "Schedule fire failed");
                None
            }
        };

        // Re-arm only if nothing replaced or stopped this timer meanwhile
        let mut registry = self.registry.lock();
        let current = registry
            .timers
            .get(&schedule_id)
            .is_some_and(|e| e.generation == generation);
        if !current {
            debug!(schedule_id = %schedule_id, generation, "Timer superseded while firing");
            return;
        }
        match next {
            Some(next) => self.arm_locked(&mut registry, schedule_id, next),
            None => {
                registry.timers.remove(&schedule_id);
            }
        }
    }

    /// Run one occurrence; returns the occurrence to arm next, if any
    async fn fire(
        &self,
        schedule_id: Uuid,
        generation: u64,
        due: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, SchedulingError> {
        let Some(schedule) = self.store.find_schedule(schedule_id).await? else {
            warn!(schedule_id = %schedule_id, "Schedule vanished before firing");
            return Ok(None);
        };
        let now = self.clock.now();
        if schedule.is_terminal(now) {
            debug!(schedule_id = %schedule_id, "Schedule became terminal before firing");
            return Ok(None);
        }
        if self.disable_if_stale(&schedule).await? {
            return Ok(None);
        }
        let Some(definition) = self.store.find_definition(schedule.definition_id).await? else {
            return Err(SchedulingError::DefinitionNotFound(schedule.definition_id));
        };

        // A stop issued after the claim cancels the occurrence
        if !self.is_current(schedule_id, generation) {
            debug!(schedule_id = %schedule_id, "Timer stopped while firing, skipping creation");
            return Ok(None);
        }

        match self.generator.generate(&definition, due).await {
            Ok(item) => info!(
                schedule_id = %schedule_id,
                work_item_id = %item.id,
                %due,
                "Generated scheduled work item"
            ),
            Err(e) => error!(
                schedule_id = %schedule_id,
                %due,
                error = %e,
                "Failed to generate scheduled work item"
            ),
        }

        if self.disable_if_stale(&schedule).await? {
            return Ok(None);
        }
        Ok(next_after(&schedule, due))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::domain::{RecurringDefinition, WorkItem, WorkItemStatus};
    use crate::persistence::{InMemoryMaintenanceStore, RecordKind};
    use crate::schedule::generator::TemplateWorkItemGenerator;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::time::Duration as StdDuration;
    use tokio::sync::Notify;

    /// Holds every `generate` call until released
    struct GatedGenerator {
        inner: TemplateWorkItemGenerator,
        calls: Mutex<Vec<DateTime<Utc>>>,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl WorkItemGenerator for GatedGenerator {
        async fn generate(
            &self,
            definition: &RecurringDefinition,
            occurs_on: DateTime<Utc>,
        ) -> Result<WorkItem, SchedulingError> {
            self.calls.lock().push(occurs_on);
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.generate(definition, occurs_on).await
        }
    }

    struct Fixture {
        store: Arc<InMemoryMaintenanceStore>,
        dispatcher: Dispatcher,
        anchor: DateTime<Utc>,
    }

    fn fixture(policy: StalenessPolicy) -> Fixture {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let store = Arc::new(InMemoryMaintenanceStore::new());
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(anchor));
        let generator = Arc::new(TemplateWorkItemGenerator::new(store.clone(), clock.clone()));
        let dispatcher = Dispatcher::new(store.clone(), generator, clock, policy);
        Fixture {
            store,
            dispatcher,
            anchor,
        }
    }

    async fn persist(
        store: &InMemoryMaintenanceStore,
        starts_on: DateTime<Utc>,
        frequency_days: u32,
    ) -> Schedule {
        let definition = RecurringDefinition::new(Uuid::now_v7(), "Daily walkdown");
        let schedule = Schedule::new(definition.id, starts_on, frequency_days);
        store.save_definition(&definition).await.unwrap();
        store.save_schedule(&schedule).await.unwrap();
        schedule
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration.to_std().unwrap()).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_and_rearms() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 1).await;

        let due = f.dispatcher.schedule_next(&schedule).await.unwrap();
        assert_eq!(due, Some(f.anchor + Duration::hours(1)));
        assert!(f.dispatcher.is_armed(schedule.id));

        advance(Duration::hours(2)).await;

        let items = f.store.work_items_for_definition(schedule.definition_id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].due_date, Some(f.anchor + Duration::hours(1)));
        assert_eq!(
            f.dispatcher.next_due(schedule.id),
            Some(f.anchor + Duration::hours(1) + Duration::days(1))
        );

        advance(Duration::days(3)).await;
        assert_eq!(f.store.work_items_for_definition(schedule.definition_id).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_schedule_disables_itself() {
        let policy = StalenessPolicy::new(3, vec![WorkItemStatus::Complete]);
        let f = fixture(policy);
        let schedule = persist(&f.store, f.anchor, 1).await;

        f.dispatcher.schedule_next(&schedule).await.unwrap();
        advance(Duration::days(10)).await;

        assert_eq!(f.store.work_items_for_definition(schedule.definition_id).len(), 3);
        let stored = f.store.find_schedule(schedule.id).await.unwrap().unwrap();
        assert!(stored.disabled);
        assert!(!f.dispatcher.is_armed(schedule.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_work_keeps_schedule_running() {
        let policy = StalenessPolicy::new(2, vec![WorkItemStatus::Complete]);
        let f = fixture(policy);
        // Fire mid-day so occurrences never coincide with the test's own wake-ups
        let schedule = persist(&f.store, f.anchor + Duration::hours(12), 1).await;

        f.dispatcher.schedule_next(&schedule).await.unwrap();
        for _ in 0..4 {
            // Close everything generated so far, then let the next day fire
            for item in f.store.work_items_for_definition(schedule.definition_id) {
                let done = item.with_status(WorkItemStatus::Complete);
                f.store.save_work_item(&done).await.unwrap();
            }
            advance(Duration::days(1)).await;
        }

        assert!(f.dispatcher.is_armed(schedule.id));
        assert!(!f.store.find_schedule(schedule.id).await.unwrap().unwrap().disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_schedule_is_not_armed_or_disabled() {
        let f = fixture(StalenessPolicy::default());
        let ended = Schedule::new(Uuid::now_v7(), f.anchor - Duration::days(30), 7)
            .with_ends_on(f.anchor - Duration::days(1));
        f.store.save_schedule(&ended).await.unwrap();
        let saves = f.store.save_count(RecordKind::Schedule);

        assert_eq!(f.dispatcher.schedule_next(&ended).await.unwrap(), None);
        assert_eq!(f.dispatcher.schedule_next(&ended).await.unwrap(), None);

        assert!(!f.dispatcher.is_armed(ended.id));
        assert_eq!(f.store.save_count(RecordKind::Schedule), saves);
        assert!(!f.store.find_schedule(ended.id).await.unwrap().unwrap().disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_schedule_is_not_armed() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor, 1).await.with_disabled(true);
        assert_eq!(f.dispatcher.schedule_next(&schedule).await.unwrap(), None);
        assert_eq!(f.dispatcher.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_then_schedule_leaves_one_timer() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 1).await;

        f.dispatcher.schedule_next(&schedule).await.unwrap();
        f.dispatcher.schedule_next(&schedule).await.unwrap();
        f.dispatcher.stop(schedule.id);
        f.dispatcher.schedule_next(&schedule).await.unwrap();
        assert_eq!(f.dispatcher.armed_count(), 1);

        advance(Duration::hours(2)).await;
        assert_eq!(f.store.work_items_for_definition(schedule.definition_id).len(), 1);
        assert_eq!(f.dispatcher.armed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_due_prevents_creation() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 1).await;

        f.dispatcher.schedule_next(&schedule).await.unwrap();
        f.dispatcher.stop(schedule.id);
        f.dispatcher.stop(schedule.id);
        advance(Duration::days(2)).await;

        assert_eq!(f.store.work_item_count(), 0);
        assert!(!f.dispatcher.is_armed(schedule.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_timer() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 1).await;
        f.dispatcher.schedule_next(&schedule).await.unwrap();

        let mut moved = schedule.clone();
        moved.starts_on = f.anchor + Duration::hours(5);
        moved.frequency_days = 7;
        f.store.save_schedule(&moved).await.unwrap();
        let due = f.dispatcher.reschedule(schedule.id, &moved).await.unwrap();

        assert_eq!(due, Some(f.anchor + Duration::hours(5)));
        assert_eq!(f.dispatcher.armed_count(), 1);

        advance(Duration::hours(6)).await;
        let items = f.store.work_items_for_definition(schedule.definition_id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].due_date, Some(f.anchor + Duration::hours(5)));
        assert_eq!(
            f.dispatcher.next_due(schedule.id),
            Some(f.anchor + Duration::hours(5) + Duration::days(7))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_during_fire_does_not_repeat_occurrence() {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let store = Arc::new(InMemoryMaintenanceStore::new());
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(anchor));
        let generator = Arc::new(GatedGenerator {
            inner: TemplateWorkItemGenerator::new(store.clone(), clock.clone()),
            calls: Mutex::new(Vec::new()),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let dispatcher = Dispatcher::new(
            store.clone(),
            generator.clone(),
            clock,
            StalenessPolicy::default(),
        );
        let schedule = persist(&store, anchor + Duration::hours(1), 1).await;
        let due = anchor + Duration::hours(1);
        dispatcher.schedule_next(&schedule).await.unwrap();

        // The timer is now inside `generate` for `due`, and the clock reads `due`
        generator.entered.notified().await;
        let rearmed = dispatcher.reschedule(schedule.id, &schedule).await.unwrap();
        assert_eq!(rearmed, Some(due + Duration::days(1)));

        generator.release.notify_one();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(*generator.calls.lock(), vec![due]);
        let items = store.work_items_for_definition(schedule.definition_id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].due_date, Some(due));
        assert_eq!(dispatcher.next_due(schedule.id), Some(due + Duration::days(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_claimed_occurrence_survives_stop_until_forgotten() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 7).await;
        let due = f.anchor + Duration::hours(1);
        f.dispatcher.schedule_next(&schedule).await.unwrap();
        advance(Duration::hours(1)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(f.store.work_items_for_definition(schedule.definition_id).len(), 1);

        // Moving the start back onto the fired instant must not fire it again
        f.dispatcher.stop(schedule.id);
        let mut moved = schedule.clone();
        moved.frequency_days = 1;
        assert_eq!(
            f.dispatcher.reschedule(schedule.id, &moved).await.unwrap(),
            Some(due + Duration::days(1))
        );

        f.dispatcher.forget(schedule.id);
        assert!(!f.dispatcher.is_armed(schedule.id));
        assert_eq!(
            f.dispatcher.schedule_next(&moved).await.unwrap(),
            Some(due)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_sees_disable_made_after_arming() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 1).await;
        f.dispatcher.schedule_next(&schedule).await.unwrap();

        let disabled = schedule.clone().with_disabled(true);
        f.store.save_schedule(&disabled).await.unwrap();
        advance(Duration::hours(2)).await;

        assert_eq!(f.store.work_item_count(), 0);
        assert!(!f.dispatcher.is_armed(schedule.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_creation_still_rearms() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::hours(1), 1).await;
        f.dispatcher.schedule_next(&schedule).await.unwrap();

        f.store.set_fail_writes(true);
        advance(Duration::hours(2)).await;

        assert_eq!(f.store.work_item_count(), 0);
        assert_eq!(
            f.dispatcher.next_due(schedule.id),
            Some(f.anchor + Duration::hours(1) + Duration::days(1))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_next_by_id() {
        let f = fixture(StalenessPolicy::default());
        let schedule = persist(&f.store, f.anchor + Duration::days(2), 3).await;

        let due = f.dispatcher.schedule_next_by_id(schedule.id).await.unwrap();
        assert_eq!(due, Some(f.anchor + Duration::days(2)));

        let missing = Uuid::now_v7();
        let err = f.dispatcher.schedule_next_by_id(missing).await.unwrap_err();
        assert!(matches!(err, SchedulingError::ScheduleNotFound(id) if id == missing));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_all_and_shutdown() {
        let f = fixture(StalenessPolicy::default());
        persist(&f.store, f.anchor + Duration::hours(1), 1).await;
        persist(&f.store, f.anchor - Duration::days(3), 7).await;
        let off = persist(&f.store, f.anchor, 1).await.with_disabled(true);
        f.store.save_schedule(&off).await.unwrap();

        let armed = f.dispatcher.restore_all().await.unwrap();
        assert_eq!(armed, 2);
        assert_eq!(f.dispatcher.armed_count(), 2);

        f.dispatcher.shutdown();
        assert_eq!(f.dispatcher.armed_count(), 0);
        tokio::time::sleep(StdDuration::from_secs(86_400 * 10)).await;
        assert_eq!(f.store.work_item_count(), 0);
    }
}
