use std::sync::Arc;

use comy_core::error::Result;
use comy_core::protocol::{
    AuthenticationResponse, ClientMessage, CommandResponse, ServerInfo, ServerMessage, ServerState,
};

use crate::auth::{AuthenticationOutcome, Authorizer};
use crate::catalog::CommandRegistry;
use crate::exec::CommandExecutor;
use crate::hub::Connection;

/// Routes decoded client messages to the catalog, token service and executor.
pub struct Dispatcher {
    server_name: String,
    registry: Arc<CommandRegistry>,
    authorizer: Arc<Authorizer>,
    executor: Arc<CommandExecutor>,
}

impl Dispatcher {
    pub fn new(
        server_name: impl Into<String>,
        registry: Arc<CommandRegistry>,
        authorizer: Arc<Authorizer>,
        executor: Arc<CommandExecutor>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            registry,
            authorizer,
            executor,
        }
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            server_name: self.server_name.clone(),
            is_secured: self.authorizer.is_secured(),
        }
    }

    /// Catalog as seen by the bearer of `token`.
    ///
    /// The token is verified once for the whole catalog. If nothing is
    /// visible in a non-empty catalog, `authError` explains why.
    pub fn state_for(&self, token: Option<&str>) -> ServerState {
        let catalog = self.registry.snapshot();
        let verification = self.authorizer.verify(token);

        let commands: Vec<_> = catalog
            .iter()
            .filter(|c| {
                self.authorizer
                    .permits(verification.as_ref(), c.security_groups())
            })
            .map(|c| c.descriptor())
            .collect();

        let auth_error = (commands.is_empty() && !catalog.is_empty()).then(|| {
            AuthenticationResponse::unauthorized(
                token.map(str::to_owned),
                verification.as_ref().is_some_and(|v| v.is_expired()),
            )
        });

        ServerState {
            name: self.server_name.clone(),
            commands,
            auth_error,
        }
    }

    pub async fn handle(&self, conn: &Connection, msg: ClientMessage) -> Result<()> {
        tracing::debug!(conn = conn.id(), kind = msg.kind(), "dispatch");

        match msg {
            ClientMessage::NeedState(req) => {
                let state = self.state_for(req.token.as_deref());
                conn.send(&state.into()).await
            }
            ClientMessage::ExecuteCommand(req) => {
                self.executor.dispatch(req, conn.clone()).await;
                Ok(())
            }
            ClientMessage::AuthenticateCredentials(req) => {
                let resp: ServerMessage = match self.authorizer.tokens().authenticate(&req.username, &req.password) {
                    Ok(AuthenticationOutcome::Authenticated {
                        access_token,
                        refresh_token,
                        username,
                    }) => {
                        tracing::info!(conn = conn.id(), user = %username, "authenticated");
                        AuthenticationResponse::logged_in(access_token, refresh_token, username).into()
                    }
                    Ok(AuthenticationOutcome::WrongCredentials) => {
                        tracing::info!(conn = conn.id(), user = %req.username, "wrong credentials");
                        AuthenticationResponse::wrong_credentials().into()
                    }
                    Err(e) => {
                        tracing::error!(conn = conn.id(), error = %e, "token issuing failed");
                        CommandResponse::unexpected_error().into()
                    }
                };
                conn.send(&resp).await
            }
            ClientMessage::AuthenticateToken(req) => {
                let verification = self.authorizer.tokens().verify(&req.token);
                let resp = match verification.user() {
                    Some(user) => AuthenticationResponse::token_accepted(user.username.clone()),
                    None => {
                        tracing::debug!(conn = conn.id(), expired = verification.is_expired(), "token rejected");
                        AuthenticationResponse::token_rejected(verification.is_expired())
                    }
                };
                conn.send(&resp.into()).await
            }
            ClientMessage::RefreshToken(req) => {
                let resp = match self.authorizer.tokens().refresh(&req.refresh_token) {
                    Some(token) => AuthenticationResponse::refreshed(token),
                    None => AuthenticationResponse::refresh_rejected(),
                };
                conn.send(&resp.into()).await
            }
        }
    }
}
