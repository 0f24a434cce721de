//! Store module
//!
//! Record-store abstractions for the four persisted collections:
//! - UserStore: registered users
//! - FactoryStore: factory site names
//! - EquipmentStore: equipment records
//! - TaskStore: inspection tasks
//!
//! Every mutation is followed by a durable persist of its collection.
//! Collections are independent; no referential integrity is enforced
//! between them. Implementations live in the patrol-stores crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Equipment, EquipmentId, NewTask, Priority, Task, TaskId, TaskStatus, User};

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Registered users, in insertion order. Users are never deleted.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Returns false (and stores nothing) when the
    /// user_id already has a record.
    async fn add_user(&self, user: User) -> Result<bool, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    async fn all_users(&self) -> Result<Vec<User>, StoreError>;

    /// Merge additional factory priorities into an existing user's map.
    /// Existing entries are overwritten, none are removed. Returns false
    /// when the user does not exist.
    async fn merge_priorities(
        &self,
        user_id: &str,
        priorities: &[(String, Priority)],
    ) -> Result<bool, StoreError>;
}

/// Factory site names, an ordered list of unique strings.
#[async_trait]
pub trait FactoryStore: Send + Sync {
    async fn list_factories(&self) -> Result<Vec<String>, StoreError>;

    /// Append a factory name. Returns false for an exact duplicate.
    async fn add_factory(&self, name: &str) -> Result<bool, StoreError>;

    /// Remove a factory name. Returns false when absent. Referencing
    /// users and tasks are left untouched.
    async fn remove_factory(&self, name: &str) -> Result<bool, StoreError>;

    /// Initialise the collection when it is empty; otherwise a no-op.
    async fn seed_factories(&self, names: &[String]) -> Result<(), StoreError>;
}

/// Equipment records with store-assigned monotonic ids.
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    /// Append an equipment record, assigning the next id. Ids are never
    /// reused, even after deletions.
    async fn add_equipment(
        &self,
        factory: &str,
        name: &str,
        kind: &str,
    ) -> Result<Equipment, StoreError>;

    async fn remove_equipment(&self, id: EquipmentId) -> Result<bool, StoreError>;

    /// All records, optionally filtered by exact factory match.
    async fn list_equipments(&self, factory: Option<&str>) -> Result<Vec<Equipment>, StoreError>;
}

/// Inspection tasks with store-assigned monotonic ids.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Append a task record with status `Pending`, assigning the next id.
    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError>;

    /// Returns false when no task has this id.
    async fn update_status(&self, id: TaskId, status: TaskStatus) -> Result<bool, StoreError>;

    /// Whether any task already exists for this factory on this date.
    async fn exists_for(&self, factory: &str, date: NaiveDate) -> Result<bool, StoreError>;
}
