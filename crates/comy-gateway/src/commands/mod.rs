//! Built-in demo commands served by the binary.

mod computation;
mod dice;

use comy_core::error::Result;
use comy_core::protocol::CommandResult;

use crate::catalog::{Command, CommandInfos};

pub use computation::useless_computation;
pub use dice::dices_simulator;

pub fn whoami() -> Result<Command> {
    Command::sync("Who am I", |infos: CommandInfos| match infos.caller {
        Some(caller) => match caller.group {
            Some(group) => CommandResult::success(format!("{} ({group})", caller.username)),
            None => CommandResult::success(caller.username),
        },
        None => CommandResult::success("Anonymous"),
    })
    .build()
}

pub fn builtin() -> Result<Vec<Command>> {
    Ok(vec![dices_simulator()?, whoami()?, useless_computation()?])
}
