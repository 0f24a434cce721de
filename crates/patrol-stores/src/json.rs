//! Flat-file JSON record store.
//!
//! Each collection is one JSON array file under the data directory,
//! rewritten in full (pretty-printed) after every mutation:
//! `users.json`, `tasks.json`, `factories.json`, `equipments.json`.
//!
//! Collections are loaded once at construction and held in memory; each
//! one sits behind its own lock, so a registration completing while the
//! daily assignment reads users cannot lose an update. Id counters are
//! seeded from the max id present at load and only ever move forward.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use patrol_core::store::{EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore};
use patrol_core::types::{
    Equipment, EquipmentId, NewTask, Priority, Task, TaskId, TaskStatus, User,
};

const USERS_FILE: &str = "users.json";
const TASKS_FILE: &str = "tasks.json";
const FACTORIES_FILE: &str = "factories.json";
const EQUIPMENTS_FILE: &str = "equipments.json";

/// JSON flat-file implementation of all four record stores.
pub struct JsonStore {
    dir: PathBuf,
    users: RwLock<Vec<User>>,
    factories: RwLock<Vec<String>>,
    equipments: RwLock<Vec<Equipment>>,
    tasks: RwLock<Vec<Task>>,
    last_equipment_id: AtomicU64,
    last_task_id: AtomicU64,
}

impl JsonStore {
    /// Open (or initialise) a store rooted at `dir`. Missing files mean
    /// empty collections.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io(e.to_string()))?;

        let users: Vec<User> = load_collection(&dir.join(USERS_FILE))?;
        let factories: Vec<String> = load_collection(&dir.join(FACTORIES_FILE))?;
        let equipments: Vec<Equipment> = load_collection(&dir.join(EQUIPMENTS_FILE))?;
        let tasks: Vec<Task> = load_collection(&dir.join(TASKS_FILE))?;

        let last_equipment_id = equipments.iter().map(|e| e.id).max().unwrap_or(0);
        let last_task_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);

        tracing::debug!(
            dir = %dir.display(),
            users = users.len(),
            factories = factories.len(),
            equipments = equipments.len(),
            tasks = tasks.len(),
            "record store loaded"
        );

        Ok(Self {
            dir,
            users: RwLock::new(users),
            factories: RwLock::new(factories),
            equipments: RwLock::new(equipments),
            tasks: RwLock::new(tasks),
            last_equipment_id: AtomicU64::new(last_equipment_id),
            last_task_id: AtomicU64::new(last_task_id),
        })
    }

    fn persist<T: Serialize>(&self, file: &str, records: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(self.dir.join(file), json).map_err(|e| StoreError::Io(e.to_string()))
    }
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl UserStore for JsonStore {
    async fn add_user(&self, user: User) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.user_id == user.user_id) {
            return Ok(false);
        }
        users.push(user);
        self.persist(USERS_FILE, &users)?;
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
        self.persist(USERS_FILE, &users)?;
        Ok(true)
    }
}

#[async_trait]
impl FactoryStore for JsonStore {
    async fn list_factories(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.factories.read().await.clone())
    }

    async fn add_factory(&self, name: &str) -> Result<bool, StoreError> {
        let mut factories = self.factories.write().await;
        if factories.iter().any(|f| f == name) {
            return Ok(false);
        }
        factories.push(name.to_string());
        self.persist(FACTORIES_FILE, &factories)?;
        Ok(true)
    }

    async fn remove_factory(&self, name: &str) -> Result<bool, StoreError> {
        let mut factories = self.factories.write().await;
        let Some(pos) = factories.iter().position(|f| f == name) else {
            return Ok(false);
        };
        factories.remove(pos);
        self.persist(FACTORIES_FILE, &factories)?;
        Ok(true)
    }

    async fn seed_factories(&self, names: &[String]) -> Result<(), StoreError> {
        let mut factories = self.factories.write().await;
        if !factories.is_empty() {
            return Ok(());
        }
        factories.extend(names.iter().cloned());
        self.persist(FACTORIES_FILE, &factories)?;
        Ok(())
    }
}

#[async_trait]
impl EquipmentStore for JsonStore {
    async fn add_equipment(
        &self,
        factory: &str,
        name: &str,
        kind: &str,
    ) -> Result<Equipment, StoreError> {
        let mut equipments = self.equipments.write().await;
        let id = self.last_equipment_id.fetch_add(1, Ordering::SeqCst) + 1;
        let equipment = Equipment {
            id,
            factory: factory.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
        };
        equipments.push(equipment.clone());
        self.persist(EQUIPMENTS_FILE, &equipments)?;
        Ok(equipment)
    }

    async fn remove_equipment(&self, id: EquipmentId) -> Result<bool, StoreError> {
        let mut equipments = self.equipments.write().await;
        let Some(pos) = equipments.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        equipments.remove(pos);
        self.persist(EQUIPMENTS_FILE, &equipments)?;
        Ok(true)
    }

    async fn list_equipments(&self, factory: Option<&str>) -> Result<Vec<Equipment>, StoreError> {
        let equipments = self.equipments.read().await;
        Ok(equipments
            .iter()
            .filter(|e| factory.is_none_or(|f| e.factory == f))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskStore for JsonStore {
    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let id = self.last_task_id.fetch_add(1, Ordering::SeqCst) + 1;
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
        self.persist(TASKS_FILE, &tasks)?;
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
        self.persist(TASKS_FILE, &tasks)?;
        Ok(true)
    }

    async fn exists_for(&self, factory: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().any(|t| t.factory == factory && t.date == date))
    }
}
