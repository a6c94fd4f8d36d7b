//! Persistence layer for schedules, entities and workflows
//!
//! This module provides:
//! - [`MaintenanceStore`] trait, the only way the engines touch storage
//! - [`InMemoryMaintenanceStore`] for tests and the single-process worker
//! - [`Snapshot`] for seeding the in-memory store from JSON

mod memory;
mod snapshot;
mod store;

pub use memory::InMemoryMaintenanceStore;
pub use snapshot::Snapshot;
pub use store::{MaintenanceStore, RecordKind, StoreError};
