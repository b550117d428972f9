//! Reimbursement autofill pipeline
//!
//! Drives one browser session through the portal: login, open the record
//! dialog, fill basic and payment info, add and fill cost-detail rows, attach
//! invoices and save. Each unit of work is classified hard-fail or soft-fail
//! by [`StepPolicy`]; every attempt is narrated through the task's progress sink.

pub mod context;
pub mod executor;
pub mod fixture;
pub mod pacing;
pub mod portal;
pub mod steps;
pub mod types;

pub use context::FlowContext;
pub use executor::{AutofillFlow, FlowExecutor};
pub use pacing::PacingConfig;
pub use portal::PortalLayout;
pub use types::{FailureStrategy, FlowReport, StepKind, StepPolicy};
