use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use comy_core::param::Params;
use serde_json::Value;
use comy_core::protocol::{AuthenticationResponse, CommandResponse, CommandResult, ExecuteCommand};

use crate::auth::Authorizer;
use crate::catalog::{Command, CommandInfos, CommandRegistry, Execution};
use crate::exec::race::{race, Resolution};
use crate::hub::Connection;

const PERMISSIONS_MISSING: &str = "Permissions missing";
const TIMED_OUT: &str = "Command timed out";
const UNEXPECTED: &str = "Unexpected error";

/// Runs catalog commands on behalf of connections.
///
/// Each accepted request produces exactly one `CommandResponse`.
pub struct CommandExecutor {
    registry: Arc<CommandRegistry>,
    authorizer: Arc<Authorizer>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(registry: Arc<CommandRegistry>, authorizer: Arc<Authorizer>, timeout: Duration) -> Self {
        Self {
            registry,
            authorizer,
            timeout,
        }
    }

    /// Look the command up and run it off the session task.
    ///
    /// Unknown names are answered immediately; everything else is answered
    /// from a spawned task so a slow body never stalls the reader loop.
    pub async fn dispatch(self: &Arc<Self>, req: ExecuteCommand, conn: Connection) {
        let Some(command) = self.registry.get(&req.command_name) else {
            tracing::debug!(command = %req.command_name, "command not found");
            let resp = CommandResponse::not_found(&req.command_name);
            if let Err(e) = conn.send(&resp.into()).await {
                tracing::debug!(error = %e, "drop response for closed connection");
            }
            return;
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let resp = this.execute(command, req.token, req.params).await;
            if let Err(e) = conn.send(&resp.into()).await {
                tracing::debug!(conn = conn.id(), error = %e, "drop response for closed connection");
            }
        });
    }

    /// Authorize, coerce, run. Always returns the single response for this request.
    pub async fn execute(
        &self,
        command: Arc<Command>,
        token: Option<String>,
        raw: HashMap<String, Value>,
    ) -> CommandResponse {
        let name = command.name().to_owned();

        let authz = self
            .authorizer
            .authorize(token.as_deref(), command.security_groups());
        if !authz.allowed {
            tracing::info!(command = %name, "permission denied");
            let mut resp = CommandResponse::new(&name, CommandResult::failure(PERMISSIONS_MISSING));
            resp.auth_error = Some(AuthenticationResponse::unauthorized(
                token,
                authz.token_expired(),
            ));
            return resp;
        }

        let params = match Params::coerce(command.parameters(), &raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(command = %name, error = %e, "parameter rejected");
                return CommandResponse::new(&name, CommandResult::failure(e.status_message()));
            }
        };

        let infos = CommandInfos {
            caller: authz.user().map(|u| u.caller()),
            params,
        };

        let result = match command.execution() {
            Execution::Sync(handler) => {
                // a panicking body must still produce its one response
                let handler = Arc::clone(handler);
                match tokio::task::spawn_blocking(move || handler.run(infos)).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(command = %name, error = %e, "command body panicked");
                        CommandResult::failure(UNEXPECTED)
                    }
                }
            }
            Execution::Async(handler) => {
                let (deadline, completion, probe) = race();
                let handler = Arc::clone(handler);
                tokio::spawn(async move {
                    handler.run(infos, completion, probe).await;
                });
                match deadline.resolve(self.timeout).await {
                    Resolution::Completed(result) => result,
                    Resolution::TimedOut => {
                        tracing::warn!(command = %name, timeout = ?self.timeout, "command timed out");
                        CommandResult::failure(TIMED_OUT)
                    }
                }
            }
        };

        CommandResponse::new(name, result)
    }
}
