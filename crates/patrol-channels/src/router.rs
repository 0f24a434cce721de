//! Inbound message routing.
//!
//! Every inbound event produces at most one reply. Errors are translated
//! to user-facing text; nothing in here is fatal to the process.

use std::sync::Arc;

use thiserror::Error;

use patrol_core::dispatch::{DispatchError, MessageDispatcher};
use patrol_core::registration::RegistrationFlow;
use patrol_core::store::{StoreError, TaskStore, UserStore};
use patrol_core::types::{Role, TaskId, TaskStatus};
use patrol_core::DirectoryService;

/// Channel error types
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

const GREETING: &str = "哈囉！我是巡檢助手。\n輸入「註冊」即可開始註冊。";
const HELP_TEXT: &str =
    "我不懂你說什麼。\n可使用：\n• 註冊\n• 我的任務\n• 完成 <任務ID>";
const ADMIN_ONLY: &str = "此指令需要管理員權限。";

/// Routes inbound text to the registration flow, task queries, the
/// completion handler, and the admin command surface.
pub struct MessageRouter {
    flow: RegistrationFlow,
    directory: DirectoryService,
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    dispatcher: Arc<dyn MessageDispatcher>,
}

impl MessageRouter {
    pub fn new(
        flow: RegistrationFlow,
        directory: DirectoryService,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> Self {
        Self {
            flow,
            directory,
            users,
            tasks,
            dispatcher,
        }
    }

    /// Handle one inbound text message, sending exactly one reply.
    pub async fn handle_message(
        &self,
        user_id: &str,
        reply_token: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        let text = text.trim();

        let reply = if self.flow.is_active(user_id).await {
            self.flow.handle(user_id, text).await?.reply().to_string()
        } else {
            self.dispatch_command(user_id, text).await?
        };

        self.dispatcher.reply(reply_token, &reply).await?;
        Ok(())
    }

    /// Greet a user who just followed the bot.
    pub async fn handle_follow(&self, user_id: &str) -> Result<(), ChannelError> {
        self.dispatcher.push(user_id, GREETING).await?;
        Ok(())
    }

    async fn dispatch_command(&self, user_id: &str, text: &str) -> Result<String, ChannelError> {
        if text == "註冊" {
            return Ok(self.flow.start(user_id).await);
        }
        if text == "我的任務" {
            return self.today_tasks(user_id).await;
        }
        if let Some(rest) = text.strip_prefix("完成") {
            return self.complete_task(user_id, rest.trim()).await;
        }

        if let Some(admin_command) = parse_admin_command(text) {
            if !self.is_admin(user_id).await? {
                return Ok(ADMIN_ONLY.to_string());
            }
            return match admin_command {
                AdminCommand::AddFactory(name) => self.add_factory(name).await,
                AdminCommand::DeleteFactory(name) => self.delete_factory(name).await,
                AdminCommand::AddEquipment(args) => self.add_equipment(args).await,
                AdminCommand::DeleteEquipment(arg) => self.delete_equipment(arg).await,
                AdminCommand::ListEquipments(arg) => self.equipment_list(arg).await,
            };
        }

        Ok(HELP_TEXT.to_string())
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, ChannelError> {
        let user = self.users.get_user(user_id).await?;
        Ok(user.is_some_and(|u| u.role == Role::Admin))
    }

    async fn today_tasks(&self, user_id: &str) -> Result<String, ChannelError> {
        let today = chrono::Local::now().date_naive();
        let tasks: Vec<_> = self
            .tasks
            .list_by_date(today)
            .await?
            .into_iter()
            .filter(|t| t.assigned_user_id == user_id)
            .collect();

        if tasks.is_empty() {
            return Ok("今天沒有任務。".to_string());
        }

        let lines: Vec<String> = tasks
            .iter()
            .map(|t| {
                format!(
                    "任務ID {}\n廠區：{}\n機台：{}\n狀態：{}\n",
                    t.id,
                    t.factory,
                    t.machine,
                    t.status.label()
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// Mark a task done, but only for its own assignee.
    async fn complete_task(&self, user_id: &str, arg: &str) -> Result<String, ChannelError> {
        let Ok(task_id) = arg.parse::<TaskId>() else {
            return Ok("格式：完成 <任務ID>".to_string());
        };

        let Some(task) = self.tasks.get_task(task_id).await? else {
            return Ok(format!("找不到任務 {task_id}。"));
        };
        if task.assigned_user_id != user_id {
            return Ok(format!("任務 {task_id} 不是指派給你的。"));
        }
        if task.is_done() {
            return Ok(format!("任務 {task_id} 已經完成了。"));
        }

        self.tasks.update_status(task_id, TaskStatus::Done).await?;
        tracing::info!(task_id, user_id = %user_id, "task completed");
        Ok(format!("任務 {task_id} 已標記完成，辛苦了！"))
    }
}

/// The admin command surface. Role gating happens before these run.
enum AdminCommand<'a> {
    AddFactory(&'a str),
    DeleteFactory(&'a str),
    AddEquipment(&'a str),
    DeleteEquipment(&'a str),
    ListEquipments(&'a str),
}

fn parse_admin_command(text: &str) -> Option<AdminCommand<'_>> {
    if let Some(rest) = text.strip_prefix("新增廠區") {
        return Some(AdminCommand::AddFactory(rest.trim()));
    }
    if let Some(rest) = text.strip_prefix("刪除廠區") {
        return Some(AdminCommand::DeleteFactory(rest.trim()));
    }
    if let Some(rest) = text.strip_prefix("新增設備") {
        return Some(AdminCommand::AddEquipment(rest.trim()));
    }
    if let Some(rest) = text.strip_prefix("刪除設備") {
        return Some(AdminCommand::DeleteEquipment(rest.trim()));
    }
    if let Some(rest) = text.strip_prefix("設備清單") {
        return Some(AdminCommand::ListEquipments(rest.trim()));
    }
    None
}

/// Admin subcommands, split out so the role gate sits in one place.
impl MessageRouter {
    async fn add_factory(&self, name: &str) -> Result<String, ChannelError> {
        if self.directory.add_factory(name).await? {
            Ok(format!("已新增廠區：{name}"))
        } else {
            Ok(format!("無法新增廠區「{name}」（名稱重複或為空）。"))
        }
    }

    async fn delete_factory(&self, name: &str) -> Result<String, ChannelError> {
        if self.directory.delete_factory(name).await? {
            Ok(format!("已刪除廠區：{name}"))
        } else {
            Ok(format!("找不到廠區「{name}」。"))
        }
    }

    async fn add_equipment(&self, args: &str) -> Result<String, ChannelError> {
        let mut parts = args.split_whitespace();
        let (Some(factory), Some(name)) = (parts.next(), parts.next()) else {
            return Ok("格式：新增設備 <廠區> <名稱> [類型]".to_string());
        };
        let kind = parts.next().unwrap_or("");

        match self.directory.add_equipment(factory, name, kind).await? {
            Some(equipment) => Ok(format!(
                "已新增設備 #{}：{} {}",
                equipment.id, equipment.factory, equipment.name
            )),
            None => Ok("無法新增設備（欄位不可為空）。".to_string()),
        }
    }

    async fn delete_equipment(&self, arg: &str) -> Result<String, ChannelError> {
        let Ok(id) = arg.parse::<u64>() else {
            return Ok("格式：刪除設備 <設備ID>".to_string());
        };

        if self.directory.delete_equipment(id).await? {
            Ok(format!("已刪除設備 #{id}"))
        } else {
            Ok(format!("找不到設備 #{id}。"))
        }
    }

    async fn equipment_list(&self, arg: &str) -> Result<String, ChannelError> {
        let factory = (!arg.is_empty()).then_some(arg);
        let equipments = self.directory.list_equipments(factory).await?;

        if equipments.is_empty() {
            return Ok("目前沒有設備。".to_string());
        }

        let lines: Vec<String> = equipments
            .iter()
            .map(|e| {
                if e.kind.is_empty() {
                    format!("#{} {} {}", e.id, e.factory, e.name)
                } else {
                    format!("#{} {} {}（{}）", e.id, e.factory, e.name, e.kind)
                }
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
