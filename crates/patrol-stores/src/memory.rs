//! In-memory record store for development and testing.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use patrol_core::store::{
    EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore,
};
use patrol_core::types::{
    Equipment, EquipmentId, NewTask, Priority, Task, TaskId, TaskStatus, User,
};

/// Order-preserving in-memory implementation of all four record stores.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    factories: RwLock<Vec<String>>,
    equipments: RwLock<Vec<Equipment>>,
    tasks: RwLock<Vec<Task>>,
    last_equipment_id: AtomicU64,
    last_task_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
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

#[async_trait]
impl FactoryStore for MemoryStore {
    async fn list_factories(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.factories.read().await.clone())
    }

    async fn add_factory(&self, name: &str) -> Result<bool, StoreError> {
        let mut factories = self.factories.write().await;
        if factories.iter().any(|f| f == name) {
            return Ok(false);
        }
        factories.push(name.to_string());
        Ok(true)
    }

    async fn remove_factory(&self, name: &str) -> Result<bool, StoreError> {
        let mut factories = self.factories.write().await;
        let Some(pos) = factories.iter().position(|f| f == name) else {
            return Ok(false);
        };
        factories.remove(pos);
        Ok(true)
    }

    async fn seed_factories(&self, names: &[String]) -> Result<(), StoreError> {
        let mut factories = self.factories.write().await;
        if factories.is_empty() {
            factories.extend(names.iter().cloned());
        }
        Ok(())
    }
}

#[async_trait]
impl EquipmentStore for MemoryStore {
    async fn add_equipment(&self, factory: &str, name: &str, kind: &str) -> Result<Equipment, StoreError> {
        let mut equipments = self.equipments.write().await;
        let id = self.last_equipment_id.fetch_add(1, Ordering::SeqCst) + 1;
        let equipment = Equipment {
            id,
            factory: factory.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
        };
        equipments.push(equipment.clone());
        Ok(equipment)
    }

    async fn remove_equipment(&self, id: EquipmentId) -> Result<bool, StoreError> {
        let mut equipments = self.equipments.write().await;
        let Some(pos) = equipments.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        equipments.remove(pos);
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
impl TaskStore for MemoryStore {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_user_insert_is_rejected() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let user = User {
                user_id: "U1".to_string(),
                name: "小明".to_string(),
                factory_priority: Default::default(),
                role: patrol_core::types::Role::Technician,
            };

            assert!(store.add_user(user.clone()).await.unwrap());
            assert!(!store.add_user(user).await.unwrap());
            assert_eq!(store.all_users().await.unwrap().len(), 1);
        });
    }

    #[test]
    fn test_equipment_ids_are_not_reused_after_delete() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let first = store.add_equipment("北區廠", "逆變器A", "").await.unwrap();
            let second = store.add_equipment("北區廠", "逆變器B", "").await.unwrap();
            assert_eq!((first.id, second.id), (1, 2));

            assert!(store.remove_equipment(second.id).await.unwrap());
            let third = store.add_equipment("北區廠", "逆變器C", "").await.unwrap();
            assert_eq!(third.id, 3);
        });
    }

    #[test]
    fn test_seed_is_a_noop_when_populated() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.add_factory("舊廠").await.unwrap();
            store
                .seed_factories(&["北區廠".to_string(), "南區廠".to_string()])
                .await
                .unwrap();
            assert_eq!(store.list_factories().await.unwrap(), vec!["舊廠"]);
        });
    }
}
