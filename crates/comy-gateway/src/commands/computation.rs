use comy_core::error::Result;
use comy_core::protocol::CommandResult;

use crate::catalog::{Command, CommandInfos};
use crate::exec::{CancelProbe, Completion};

const ROUNDS: u64 = 10_000;
const ROUND_SIZE: u64 = 10_000;

/// Burns CPU in rounds, checking the probe between rounds.
pub fn useless_computation() -> Result<Command> {
    Command::asynchronous("An useless computation", compute).build()
}

async fn compute(_: CommandInfos, completion: Completion, probe: CancelProbe) {
    let mut acc: u64 = 0;
    for i in 0..ROUNDS {
        if probe.is_timed_out() {
            tracing::debug!(round = i, "computation abandoned");
            return;
        }
        for j in 0..ROUND_SIZE {
            acc = acc.wrapping_add(i ^ j);
        }
        tokio::task::yield_now().await;
    }
    completion.complete(CommandResult::success(format!("Computed {acc}")));
}
