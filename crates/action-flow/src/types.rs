//! Step classification and failure policy

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Units of work the pipeline attempts, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Navigate,
    Login,
    OpenDialog,
    /// One basic-info sub-field
    BasicField,
    /// One payment-info sub-field
    PaymentField,
    /// One "add row" click in the detail table
    AddRow,
    /// Filling every cell of one detail row
    DetailRow,
    /// One attachment
    Upload,
    Save,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Navigate => "navigate",
            StepKind::Login => "login",
            StepKind::OpenDialog => "open dialog",
            StepKind::BasicField => "basic info",
            StepKind::PaymentField => "payment info",
            StepKind::AddRow => "add row",
            StepKind::DetailRow => "detail row",
            StepKind::Upload => "upload",
            StepKind::Save => "save",
        }
    }

    /// Default classification of the step.
    pub fn default_strategy(self) -> FailureStrategy {
        match self {
            StepKind::Navigate
            | StepKind::Login
            | StepKind::OpenDialog
            | StepKind::PaymentField
            | StepKind::Save => FailureStrategy::Abort,
            StepKind::BasicField | StepKind::AddRow | StepKind::DetailRow | StepKind::Upload => {
                FailureStrategy::Continue
            }
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure strategy - how to handle step failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Abort the pipeline, the error becomes the task's terminal error
    Abort,

    /// Report the failure as a progress line and move on
    Continue,
}

/// Hard-fail / soft-fail table with per-step overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepPolicy {
    pub overrides: BTreeMap<StepKind, FailureStrategy>,
}

impl StepPolicy {
    pub fn strategy(&self, kind: StepKind) -> FailureStrategy {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_strategy())
    }

    pub fn with_override(mut self, kind: StepKind, strategy: FailureStrategy) -> Self {
        self.overrides.insert(kind, strategy);
        self
    }
}

/// Outcome of a pipeline run that reached the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReport {
    /// Soft failures that were reported and skipped, as `(step, message)`.
    pub soft_failures: Vec<(StepKind, String)>,
    pub rows_filled: usize,
    pub files_uploaded: usize,
}
