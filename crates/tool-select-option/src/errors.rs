use autofill_core_types::AutofillError;
use autofill_driver::DriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("dropdown trigger for {field} not usable: {source}")]
    Trigger {
        field: String,
        #[source]
        source: DriverError,
    },
    #[error("failed to click option {text:?} for {field}: {source}")]
    OptionClick {
        field: String,
        text: String,
        #[source]
        source: DriverError,
    },
    #[error("failed to read dropdown options for {field}: {source}")]
    Scan {
        field: String,
        #[source]
        source: DriverError,
    },
}

impl SelectError {
    fn driver_error(&self) -> &DriverError {
        match self {
            SelectError::Trigger { source, .. }
            | SelectError::OptionClick { source, .. }
            | SelectError::Scan { source, .. } => source,
        }
    }
}

impl From<SelectError> for AutofillError {
    fn from(err: SelectError) -> Self {
        match err.driver_error() {
            DriverError::NotFound(_) => AutofillError::ElementNotFound(err.to_string()),
            DriverError::NotVisible(_) | DriverError::Timeout { .. } => {
                AutofillError::ElementNotVisible(err.to_string())
            }
            _ => AutofillError::ActionFailed(err.to_string()),
        }
    }
}
