//! Driver error types

use autofill_core_types::AutofillError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Locator matched no element
    #[error("no element matches {0}")]
    NotFound(String),

    /// Element exists but is hidden
    #[error("element {0} is not visible")]
    NotVisible(String),

    /// Bounded wait expired
    #[error("timed out after {timeout_ms}ms waiting for {locator}")]
    Timeout { locator: String, timeout_ms: u64 },

    /// The browser rejected the action
    #[error("{action} on {locator} failed: {reason}")]
    ActionFailed {
        action: &'static str,
        locator: String,
        reason: String,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser session is closed")]
    SessionClosed,

    #[error("failed to launch browser session: {0}")]
    Launch(String),
}

impl DriverError {
    pub fn action(action: &'static str, locator: impl Into<String>, reason: impl Into<String>) -> Self {
        DriverError::ActionFailed {
            action,
            locator: locator.into(),
            reason: reason.into(),
        }
    }
}

impl From<DriverError> for AutofillError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NotFound(locator) => AutofillError::ElementNotFound(locator),
            DriverError::NotVisible(locator) => AutofillError::ElementNotVisible(locator),
            err @ DriverError::Timeout { .. } => AutofillError::ElementNotVisible(err.to_string()),
            DriverError::Launch(reason) => AutofillError::SessionLaunch(reason),
            other => AutofillError::ActionFailed(other.to_string()),
        }
    }
}
