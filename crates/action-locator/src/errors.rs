//! Error types for table addressing

use autofill_core_types::AutofillError;
use thiserror::Error;

use crate::types::CostColumn;

/// Table addressing error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// No header section carries the marker label
    #[error("table header \"{marker}\" not found (row {row}, column {column})")]
    HeaderNotFound {
        marker: String,
        row: usize,
        column: CostColumn,
    },

    /// Row index is zero or past the last rendered row
    #[error("row {row} out of range, table has {available} rows (column {column})")]
    RowOutOfRange {
        row: usize,
        column: CostColumn,
        available: usize,
    },

    /// Row has fewer cells than the column offset needs
    #[error("row {row} has {available} cells, column {column} not present")]
    CellOutOfRange {
        row: usize,
        column: CostColumn,
        available: usize,
    },

    /// Driver call failed while probing the table
    #[error("probing row {row}, column {column} failed: {reason}")]
    Driver {
        row: usize,
        column: CostColumn,
        reason: String,
    },
}

impl From<LocatorError> for AutofillError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::Driver { .. } => AutofillError::ActionFailed(err.to_string()),
            other => AutofillError::ElementNotFound(other.to_string()),
        }
    }
}
