//! Shared application state for the Comy server.
//!
//! Owns the catalog and the connection hub, so catalog changes and the
//! resulting state broadcast happen in one place.

use std::sync::Arc;
use std::time::Duration;

use comy_core::error::{ComyError, Result};

use crate::auth::{Authorizer, SecurityGroups, TokenService, UserDirectory};
use crate::catalog::{Command, CommandRegistry};
use crate::config::ComyConfig;
use crate::dispatch::Dispatcher;
use crate::exec::CommandExecutor;
use crate::hub::ConnectionHub;

const FAIL_FAST_ON_UNKNOWN_GROUP: bool = false; // if changed to true, boot fails.
const BROADCAST_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    dispatcher: Arc<Dispatcher>,
    hub: Arc<ConnectionHub>,
}

struct AppStateInner {
    cfg: ComyConfig,
    groups: Arc<SecurityGroups>,
    registry: Arc<CommandRegistry>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: ComyConfig, commands: Vec<Command>) -> Result<Self> {
        let security = &cfg.security;

        // 1) Security model
        let groups = Arc::new(SecurityGroups::from_config(&security.groups)?);
        let users = Arc::new(UserDirectory::from_config(&security.users, &groups)?);
        let tokens = Arc::new(TokenService::new(
            security.secret_key.as_bytes(),
            security.issuer.clone(),
            users,
        ));
        let authorizer = Arc::new(Authorizer::new(
            security.secured,
            tokens,
            Arc::clone(&groups),
        ));

        // 2) Catalog
        check_command_groups(&commands, &groups)?;
        let registry = Arc::new(CommandRegistry::with_commands(commands)?);

        // 3) Execution + routing
        let executor = Arc::new(CommandExecutor::new(
            Arc::clone(&registry),
            Arc::clone(&authorizer),
            Duration::from_millis(cfg.server.command_timeout_ms),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            cfg.server.name.clone(),
            Arc::clone(&registry),
            authorizer,
            executor,
        ));

        tracing::info!(
            secured = security.secured,
            groups = groups.len(),
            commands = registry.snapshot().len(),
            "app state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                groups,
                registry,
            }),
            dispatcher,
            hub: Arc::new(ConnectionHub::new()),
        })
    }

    pub fn cfg(&self) -> &ComyConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn hub(&self) -> Arc<ConnectionHub> {
        Arc::clone(&self.hub)
    }

    /// Add commands, then push the new anonymous-view state to everyone.
    pub async fn register_commands(&self, commands: Vec<Command>) -> Result<usize> {
        check_command_groups(&commands, &self.inner.groups)?;
        self.inner.registry.register(commands)?;
        self.broadcast_state().await
    }

    /// Swap the catalog, then push the new anonymous-view state to everyone.
    pub async fn replace_commands(&self, commands: Vec<Command>) -> Result<usize> {
        check_command_groups(&commands, &self.inner.groups)?;
        self.inner.registry.replace(commands)?;
        self.broadcast_state().await
    }

    async fn broadcast_state(&self) -> Result<usize> {
        let state = self.dispatcher.state_for(None);
        let commands = state.commands.len();
        let delivered = self.hub.broadcast(&state.into(), BROADCAST_TIMEOUT).await?;
        tracing::info!(commands, delivered, live = self.hub.len(), "state broadcast");
        Ok(delivered)
    }
}

// command security groups <-> configured groups sanity check
fn check_command_groups(commands: &[Command], groups: &SecurityGroups) -> Result<()> {
    for cmd in commands {
        for group in cmd.security_groups() {
            if !groups.contains(group) {
                tracing::warn!(command = %cmd.name(), group = %group, "command requires an unregistered security group");
                if FAIL_FAST_ON_UNKNOWN_GROUP {
                    return Err(ComyError::UnknownGroup(group.clone()));
                }
            }
        }
    }
    Ok(())
}
