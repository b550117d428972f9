//! Task registry and lifecycle manager.
//!
//! [`TaskManager`] is the contract the calling layer talks to: start a task
//! under an opaque id, read its progress stream, query its status, cancel it,
//! and sweep tasks that ended long ago. Each task owns one browser session and
//! one in-flight pipeline run; the execution wrapper guarantees that the
//! session is released and the progress channel closed exactly once on every
//! exit path, including panics.

pub mod channel;
pub mod error;
pub mod executor;
pub mod instance;
pub mod model;
pub mod runtime;

pub use channel::{CancelSignal, ProgressChannel, ProgressReceiver};
pub use error::SchedulerError;
pub use executor::{FlowRunner, RunContext, TaskRunner};
pub use instance::{SessionSlot, TaskInstance};
pub use model::{ManagerConfig, TaskRecord, TaskSnapshot};
pub use runtime::{TaskManager, CANCELLED_MESSAGE};
