use thiserror::Error;

/// Error taxonomy shared by every layer of the engine.
///
/// Crate-local errors (driver, dropdown, table) convert into this type so the
/// lifecycle manager can render a single terminal message per task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutofillError {
    /// A task with this id is already registered.
    #[error("task id already exists: {0}")]
    DuplicateTask(String),

    /// A locator resolved to nothing.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// A locator resolved but never became visible within the bounded wait.
    #[error("element not visible: {0}")]
    ElementNotVisible(String),

    /// The click/fill/upload call itself failed.
    #[error("action failed: {0}")]
    ActionFailed(String),

    /// The pipeline observed the cancellation signal at a checkpoint.
    #[error("task cancelled")]
    Cancelled,

    /// An unexpected fault inside the pipeline, converted into a failure.
    #[error("task panicked: {0}")]
    PanicRecovered(String),

    /// The browser session could not be started.
    #[error("browser session launch failed: {0}")]
    SessionLaunch(String),

    /// A hard-fail step aborted the pipeline.
    #[error("{step} failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<AutofillError>,
    },
}

impl AutofillError {
    pub fn step(step: impl Into<String>, source: AutofillError) -> Self {
        AutofillError::StepFailed {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Innermost error, skipping step wrappers.
    pub fn root(&self) -> &AutofillError {
        match self {
            AutofillError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), AutofillError::Cancelled)
    }
}
