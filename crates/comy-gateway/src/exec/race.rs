//! Single-resolution slot raced by an async command's completion callback
//! and the executor's deadline.
//!
//! Whoever flips `resolved` first owns the response. The completion side then
//! sends its result through a oneshot; the deadline side marks the race as
//! timed out. The loser's effect is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use comy_core::protocol::CommandResult;

struct Race {
    resolved: AtomicBool,
    timed_out: AtomicBool,
    tx: Mutex<Option<oneshot::Sender<CommandResult>>>,
}

impl Race {
    fn claim(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Handed to an async command body; consumed by `complete`.
pub struct Completion {
    race: Arc<Race>,
}

impl Completion {
    /// Deliver the command's result. Returns false (and drops `result`) if
    /// the deadline already fired.
    pub fn complete(self, result: CommandResult) -> bool {
        if !self.race.claim() {
            return false;
        }
        if let Some(tx) = self.race.tx.lock().take() {
            let _ = tx.send(result);
        }
        true
    }
}

/// Lets a command body observe whether it has timed out.
#[derive(Clone)]
pub struct CancelProbe {
    race: Arc<Race>,
}

impl CancelProbe {
    pub fn is_timed_out(&self) -> bool {
        self.race.timed_out.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Completed(CommandResult),
    TimedOut,
}

/// Executor side of the race.
pub struct Deadline {
    race: Arc<Race>,
    rx: oneshot::Receiver<CommandResult>,
}

impl Deadline {
    /// Wait for the body's completion or for `timeout`, whichever claims first.
    pub async fn resolve(mut self, timeout: Duration) -> Resolution {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(result)) => Resolution::Completed(result),
            Ok(Err(_)) => Resolution::Completed(CommandResult::failure("Unexpected error")),
            Err(_elapsed) => {
                if self.race.claim() {
                    self.race.timed_out.store(true, Ordering::Release);
                    return Resolution::TimedOut;
                }
                // completion claimed first; its send is imminent
                match self.rx.await {
                    Ok(result) => Resolution::Completed(result),
                    Err(_) => Resolution::Completed(CommandResult::failure("Unexpected error")),
                }
            }
        }
    }
}

/// Create a fresh race.
pub fn race() -> (Deadline, Completion, CancelProbe) {
    let (tx, rx) = oneshot::channel();
    let race = Arc::new(Race {
        resolved: AtomicBool::new(false),
        timed_out: AtomicBool::new(false),
        tx: Mutex::new(Some(tx)),
    });
    (
        Deadline {
            race: Arc::clone(&race),
            rx,
        },
        Completion {
            race: Arc::clone(&race),
        },
        CancelProbe { race },
    )
}
