use autofill_core_types::AutofillError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("task id already exists: {0}")]
    DuplicateTask(String),
    #[error("unknown task: {0}")]
    UnknownTask(String),
}

impl From<SchedulerError> for AutofillError {
    fn from(value: SchedulerError) -> Self {
        match value {
            SchedulerError::DuplicateTask(id) => AutofillError::DuplicateTask(id),
            other => AutofillError::ActionFailed(other.to_string()),
        }
    }
}
