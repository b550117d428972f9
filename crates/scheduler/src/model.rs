use std::time::Duration;

use autofill_core_types::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of a task row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub status: TaskStatus,
    pub progress: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Mutable task row. Terminal states are final and stamp `ended_at` once.
#[derive(Clone, Debug)]
pub struct TaskRecord {
    id: TaskId,
    status: TaskStatus,
    progress: String,
    error: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            progress: String::new(),
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn mark_running(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Running;
        true
    }

    /// Moves to a terminal state. Returns false if the task already ended.
    pub fn finish(&mut self, status: TaskStatus, error: Option<String>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.error = if status == TaskStatus::Failed {
            error
        } else {
            None
        };
        self.ended_at = Some(Utc::now());
        true
    }

    /// Latest-wins progress line; ignored once the task has ended.
    pub fn set_progress(&mut self, message: &str) {
        if !self.status.is_terminal() {
            self.progress = message.to_string();
        }
    }

    pub(crate) fn force_progress(&mut self, message: &str) {
        self.progress = message.to_string();
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            status: self.status,
            progress: self.progress.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Buffered progress lines per task before new lines are dropped
    pub progress_capacity: usize,
    pub session_release_timeout_ms: u64,
}

impl ManagerConfig {
    pub fn session_release_timeout(&self) -> Duration {
        Duration::from_millis(self.session_release_timeout_ms)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            progress_capacity: 64,
            session_release_timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_is_final() {
        let mut record = TaskRecord::new(TaskId::from("t"));
        assert!(record.mark_running());
        assert!(!record.mark_running());
        assert!(record.finish(TaskStatus::Failed, Some("boom".into())));
        let ended = record.ended_at();
        assert!(ended.is_some());

        assert!(!record.finish(TaskStatus::Completed, None));
        assert!(!record.finish(TaskStatus::Cancelled, None));
        assert!(!record.mark_running());
        let snapshot = record.snapshot();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
        assert_eq!(snapshot.ended_at, ended);
    }

    #[test]
    fn error_only_kept_for_failures() {
        let mut record = TaskRecord::new(TaskId::from("t"));
        record.mark_running();
        record.finish(TaskStatus::Cancelled, Some("ignored".into()));
        assert_eq!(record.snapshot().error, None);
    }

    #[test]
    fn progress_frozen_after_end() {
        let mut record = TaskRecord::new(TaskId::from("t"));
        record.mark_running();
        record.set_progress("step 1");
        record.finish(TaskStatus::Completed, None);
        record.set_progress("late line");
        assert_eq!(record.snapshot().progress, "step 1");
    }
}
