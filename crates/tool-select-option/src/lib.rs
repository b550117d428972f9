pub mod api;
pub mod errors;
pub mod model;
pub mod policy;

mod runner;

pub use api::{SelectTool, SelectToolBuilder};
pub use errors::SelectError;
pub use model::{choose_option, MatchKind, OptionView, SelectOutcome, SelectParams, SkipReason};
pub use policy::{SelectPolicyView, SelectTimeouts};
