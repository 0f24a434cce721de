//! Small in-memory fakes for exercising core logic in unit tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};

use crate::dispatch::{DispatchError, MessageDispatcher};
use crate::store::{EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore};
use crate::types::{Equipment, EquipmentId, NewTask, Priority, Task, TaskId, TaskStatus, User};

#[derive(Default)]
pub struct MemUsers {
    users: RwLock<Vec<User>>,
}

impl MemUsers {
    pub fn with(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserStore for MemUsers {
    async fn add_user(&self, user: User) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.user_id == user.user_id) {
            return Ok(false);
        }
        users.push(user);
        Ok(true)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn merge_priorities(
        &self,
        user_id: &str,
        priorities: &[(String, Priority)],
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) else {
            return Ok(false);
        };
        for (factory, priority) in priorities {
            user.factory_priority.insert(factory.clone(), *priority);
        }
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemFactories {
    names: RwLock<Vec<String>>,
}

impl MemFactories {
    pub fn with(names: &[&str]) -> Self {
        Self {
            names: RwLock::new(names.iter().map(|n| n.to_string()).collect()),
        }
    }
}

#[async_trait]
impl FactoryStore for MemFactories {
    async fn list_factories(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.names.read().await.clone())
    }

    async fn add_factory(&self, name: &str) -> Result<bool, StoreError> {
        let mut names = self.names.write().await;
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        names.push(name.to_string());
        Ok(true)
    }

    async fn remove_factory(&self, name: &str) -> Result<bool, StoreError> {
        let mut names = self.names.write().await;
        let before = names.len();
        names.retain(|n| n != name);
        Ok(names.len() != before)
    }

    async fn seed_factories(&self, defaults: &[String]) -> Result<(), StoreError> {
        let mut names = self.names.write().await;
        if names.is_empty() {
            names.extend(defaults.iter().cloned());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemEquipments {
    records: RwLock<Vec<Equipment>>,
    next_id: AtomicU64,
}

#[async_trait]
impl EquipmentStore for MemEquipments {
    async fn add_equipment(&self, factory: &str, name: &str, kind: &str) -> Result<Equipment, StoreError> {
        let mut records = self.records.write().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let equipment = Equipment {
            id,
            factory: factory.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
        };
        records.push(equipment.clone());
        Ok(equipment)
    }

    async fn remove_equipment(&self, id: EquipmentId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|e| e.id != id);
        Ok(records.len() != before)
    }

    async fn list_equipments(&self, factory: Option<&str>) -> Result<Vec<Equipment>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|e| factory.is_none_or(|f| e.factory == f))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemTasks {
    tasks: RwLock<Vec<Task>>,
    next_id: AtomicU64,
}

#[async_trait]
impl TaskStore for MemTasks {
    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let task = Task {
            id,
            factory: task.factory,
            machine: task.machine,
            assigned_user_id: task.assigned_user_id,
            task_type: task.task_type,
            date: task.date,
            status: TaskStatus::Pending,
        };
        tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|t| t.date == date).cloned().collect())
    }

    async fn update_status(&self, id: TaskId, status: TaskStatus) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.status = status;
        Ok(true)
    }

    async fn exists_for(&self, factory: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().any(|t| t.factory == factory && t.date == date))
    }
}

/// Captures outbound messages instead of delivering them.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub pushes: Mutex<Vec<(String, String)>>,
    pub replies: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessageDispatcher for RecordingDispatcher {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DispatchError> {
        let mut replies = self.replies.lock().await;
        replies.push((reply_token.to_string(), text.to_string()));
        Ok(())
    }

    async fn push(&self, user_id: &str, text: &str) -> Result<(), DispatchError> {
        let mut pushes = self.pushes.lock().await;
        pushes.push((user_id.to_string(), text.to_string()));
        Ok(())
    }
}
