//! Autofill service library
//!
//! Calling layer over the task manager: configuration, the progress
//! supervisor, the HTTP surface and the CLI commands.

pub mod cli;
pub mod config;
pub mod server;
pub mod simulate;
pub mod supervisor;

pub use config::{load_config, AppConfig, LoadedConfig};
pub use server::{router, ServeState};
pub use simulate::SimulatedRunner;
pub use supervisor::{supervise, LineSink, SinkClosed, SupervisorLimits, SupervisorOutcome};
