pub mod demo;
pub mod runtime;
pub mod serve;

pub use demo::{cmd_demo, DemoArgs};
pub use runtime::{init_logging, LogFormat};
pub use serve::{cmd_serve, ServeArgs};
