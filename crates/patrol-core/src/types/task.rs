//! Inspection task records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserId;

/// Type alias for task ids (monotonic integers assigned by the store).
pub type TaskId = u64;

/// Task lifecycle status. Known statuses get variants; free text survives a
/// round-trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Done,
    Other(String),
}

impl TaskStatus {
    pub const PENDING_LABEL: &'static str = "待執行";
    pub const DONE_LABEL: &'static str = "完成";

    /// User-facing label, also the on-disk representation.
    pub fn label(&self) -> &str {
        match self {
            TaskStatus::Pending => Self::PENDING_LABEL,
            TaskStatus::Done => Self::DONE_LABEL,
            TaskStatus::Other(label) => label,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            TaskStatus::PENDING_LABEL => TaskStatus::Pending,
            TaskStatus::DONE_LABEL => TaskStatus::Done,
            _ => TaskStatus::Other(label),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.label().to_string()
    }
}

/// One inspection assignment, scoped to a factory and a calendar date.
/// Tasks are never deleted; only their status changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub factory: String,
    pub machine: String,
    pub assigned_user_id: UserId,
    pub task_type: String,
    pub date: NaiveDate,
    pub status: TaskStatus,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Fields for a task about to be created; the store assigns the id and the
/// initial `Pending` status.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub factory: String,
    pub machine: String,
    pub assigned_user_id: UserId,
    pub task_type: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Done,
            TaskStatus::Other("延期".to_string()),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: TaskStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }

        assert_eq!(serde_json::to_string(&TaskStatus::Pending).unwrap(), "\"待執行\"");
    }

    #[test]
    fn test_task_date_serializes_as_iso_string() {
        let task = Task {
            id: 7,
            factory: "北區廠".to_string(),
            machine: "逆變器-廠01".to_string(),
            assigned_user_id: "U1".to_string(),
            task_type: "例行巡檢".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            status: TaskStatus::Pending,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["date"], "2025-11-03");
        assert!(!task.is_done());
    }
}
