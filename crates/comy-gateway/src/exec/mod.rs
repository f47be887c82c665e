//! Command execution: authorization, parameter coercion, sync/async run,
//! and the completion-vs-timeout race.

pub mod executor;
pub mod race;

pub use executor::CommandExecutor;
pub use race::{CancelProbe, Completion, Resolution};
