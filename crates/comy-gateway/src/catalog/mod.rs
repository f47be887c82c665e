//! Command catalog: command model and the uniquely-named registry.

pub mod command;
pub mod registry;

pub use command::{AsyncHandler, Command, CommandBuilder, CommandInfos, Execution, SyncHandler};
pub use registry::{Catalog, CommandRegistry};
