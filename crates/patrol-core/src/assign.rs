//! Daily task assignment.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::dispatch::MessageDispatcher;
use crate::store::{EquipmentStore, FactoryStore, StoreError, TaskStore, UserStore};
use crate::types::{NewTask, Priority, Task, User};

/// Task type stamped on every scheduled inspection.
pub const ROUTINE_INSPECTION: &str = "例行巡檢";

/// The daily batch: one task per factory, assigned to the top-priority
/// available technician, announced with a push message.
pub struct AssignmentEngine {
    users: Arc<dyn UserStore>,
    factories: Arc<dyn FactoryStore>,
    equipments: Arc<dyn EquipmentStore>,
    tasks: Arc<dyn TaskStore>,
    dispatcher: Arc<dyn MessageDispatcher>,
}

impl AssignmentEngine {
    pub fn new(
        users: Arc<dyn UserStore>,
        factories: Arc<dyn FactoryStore>,
        equipments: Arc<dyn EquipmentStore>,
        tasks: Arc<dyn TaskStore>,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> Self {
        Self {
            users,
            factories,
            equipments,
            tasks,
            dispatcher,
        }
    }

    /// Run one day's assignment over every factory, in factory-list order.
    ///
    /// A failure while processing one factory is logged and does not stop
    /// the run. Re-invocation on the same date is a no-op per factory that
    /// already has a task. Returns the tasks created by this invocation.
    pub async fn run_daily(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let factories = self.factories.list_factories().await?;
        let users = self.users.all_users().await?;

        let mut created = Vec::new();
        for factory in &factories {
            match self.assign_factory(factory, &users, date).await {
                Ok(Some(task)) => created.push(task),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(factory = %factory, error = %err, "factory assignment failed");
                }
            }
        }

        tracing::info!(count = created.len(), %date, "daily assignment finished");
        Ok(created)
    }

    async fn assign_factory(
        &self,
        factory: &str,
        users: &[User],
        date: NaiveDate,
    ) -> Result<Option<Task>, StoreError> {
        if self.tasks.exists_for(factory, date).await? {
            tracing::debug!(factory = %factory, %date, "task already exists, skipping");
            return Ok(None);
        }

        let Some(chosen) = pick_responsible(users, factory) else {
            return Ok(None);
        };

        let machine = self.machine_for(factory).await?;
        let task = self
            .tasks
            .create_task(NewTask {
                factory: factory.to_string(),
                machine: machine.clone(),
                assigned_user_id: chosen.user_id.clone(),
                task_type: ROUTINE_INSPECTION.to_string(),
                date,
            })
            .await?;

        let text = format!(
            "📌 今日任務\n廠區：{factory}\n機台：{machine}\n任務ID：{}\n完成後回覆：完成 {}",
            task.id, task.id
        );
        if let Err(err) = self.dispatcher.push(&chosen.user_id, &text).await {
            tracing::warn!(user_id = %chosen.user_id, error = %err, "task push failed");
        }

        Ok(Some(task))
    }

    /// First equipment registered for the factory, falling back to the
    /// legacy device-name template for factories without equipment.
    async fn machine_for(&self, factory: &str) -> Result<String, StoreError> {
        let equipments = self.equipments.list_equipments(Some(factory)).await?;
        if let Some(equipment) = equipments.first() {
            return Ok(equipment.name.clone());
        }

        let tag = factory.chars().last().unwrap_or('廠');
        Ok(format!("逆變器-{tag}01"))
    }
}

/// Lowest-rank technician responsible for the factory. The sort is stable,
/// so equal ranks fall back to user-list order.
fn pick_responsible<'a>(users: &'a [User], factory: &str) -> Option<&'a User> {
    let mut candidates: Vec<(&User, Priority)> = users
        .iter()
        .filter(|user| user.is_technician())
        .filter_map(|user| user.priority_for(factory).map(|p| (user, p)))
        .collect();

    candidates.sort_by_key(|(_, priority)| *priority);
    candidates.first().map(|(user, _)| *user)
}
