//! Command model.
//!
//! A command is a catalog entry plus a handler. The handler is a tagged
//! variant: synchronous bodies return their result directly, asynchronous
//! bodies report through a [`Completion`] and may poll a [`CancelProbe`].

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use comy_core::error::{ComyError, Result};
use comy_core::param::{Parameter, Params};
use comy_core::protocol::{CommandDescriptor, CommandResult, ExecutionKind};

use crate::auth::Caller;
use crate::exec::{CancelProbe, Completion};

/// Everything a command body gets to see.
#[derive(Debug, Clone)]
pub struct CommandInfos {
    /// `None` when the caller did not present a valid token.
    pub caller: Option<Caller>,
    pub params: Params,
}

pub trait SyncHandler: Send + Sync {
    fn run(&self, infos: CommandInfos) -> CommandResult;
}

impl<F> SyncHandler for F
where
    F: Fn(CommandInfos) -> CommandResult + Send + Sync,
{
    fn run(&self, infos: CommandInfos) -> CommandResult {
        (self)(infos)
    }
}

/// Asynchronous command body.
///
/// The body must call `completion.complete(..)` at most once. Once the
/// executor's deadline fires, completing is a no-op and `probe` reports the
/// timeout; bodies with long loops should check it and bail out.
#[async_trait]
pub trait AsyncHandler: Send + Sync {
    async fn run(&self, infos: CommandInfos, completion: Completion, probe: CancelProbe);
}

#[async_trait]
impl<F, Fut> AsyncHandler for F
where
    F: Fn(CommandInfos, Completion, CancelProbe) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self, infos: CommandInfos, completion: Completion, probe: CancelProbe) {
        (self)(infos, completion, probe).await
    }
}

#[derive(Clone)]
pub enum Execution {
    Sync(Arc<dyn SyncHandler>),
    Async(Arc<dyn AsyncHandler>),
}

impl Execution {
    pub fn kind(&self) -> ExecutionKind {
        match self {
            Execution::Sync(_) => ExecutionKind::Sync,
            Execution::Async(_) => ExecutionKind::Async,
        }
    }
}

pub struct Command {
    name: String,
    image_url: Option<String>,
    main_parameter: Option<Parameter>,
    secondary_parameters: Vec<Parameter>,
    security_groups: Vec<String>,
    execution: Execution,
}

impl Command {
    pub fn sync(name: impl Into<String>, handler: impl SyncHandler + 'static) -> CommandBuilder {
        CommandBuilder::new(name.into(), Execution::Sync(Arc::new(handler)))
    }

    pub fn asynchronous(name: impl Into<String>, handler: impl AsyncHandler + 'static) -> CommandBuilder {
        CommandBuilder::new(name.into(), Execution::Async(Arc::new(handler)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
    pub fn main_parameter(&self) -> Option<&Parameter> {
        self.main_parameter.as_ref()
    }
    pub fn secondary_parameters(&self) -> &[Parameter] {
        &self.secondary_parameters
    }
    /// Empty means public.
    pub fn security_groups(&self) -> &[String] {
        &self.security_groups
    }
    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    /// Main parameter (if any) followed by secondary parameters.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.main_parameter
            .iter()
            .chain(self.secondary_parameters.iter())
    }

    pub fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            main_parameter: self.main_parameter.as_ref().map(Parameter::descriptor),
            secondary_parameters: self
                .secondary_parameters
                .iter()
                .map(Parameter::descriptor)
                .collect(),
            security_groups: self.security_groups.clone(),
            kind: self.execution.kind(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("kind", &self.execution.kind())
            .field("main_parameter", &self.main_parameter)
            .field("secondary_parameters", &self.secondary_parameters)
            .field("security_groups", &self.security_groups)
            .finish()
    }
}

#[must_use]
pub struct CommandBuilder {
    name: String,
    image_url: Option<String>,
    main_parameter: Option<Parameter>,
    secondary_parameters: Vec<Parameter>,
    security_groups: Vec<String>,
    execution: Execution,
}

impl CommandBuilder {
    fn new(name: String, execution: Execution) -> Self {
        Self {
            name,
            image_url: None,
            main_parameter: None,
            secondary_parameters: Vec::new(),
            security_groups: Vec::new(),
            execution,
        }
    }

    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn main_parameter(mut self, param: Parameter) -> Self {
        self.main_parameter = Some(param);
        self
    }

    pub fn parameter(mut self, param: Parameter) -> Self {
        self.secondary_parameters.push(param);
        self
    }

    /// Restrict to callers reaching `group`. Only the lowest groups of a
    /// hierarchy need listing; their ancestors are admitted implicitly.
    pub fn security_group(mut self, group: impl Into<String>) -> Self {
        self.security_groups.push(group.into());
        self
    }

    /// Validate parameter names and main-parameter eligibility.
    pub fn build(self) -> Result<Command> {
        if let Some(main) = &self.main_parameter {
            if !main.is_main_eligible() {
                return Err(ComyError::InvalidMainParameter {
                    command: self.name,
                    parameter: main.name().to_owned(),
                });
            }
        }

        let mut seen = HashSet::new();
        for p in self.main_parameter.iter().chain(self.secondary_parameters.iter()) {
            if !seen.insert(p.name()) {
                return Err(ComyError::DuplicateParameter {
                    command: self.name.clone(),
                    parameter: p.name().to_owned(),
                });
            }
        }

        Ok(Command {
            name: self.name,
            image_url: self.image_url,
            main_parameter: self.main_parameter,
            secondary_parameters: self.secondary_parameters,
            security_groups: self.security_groups,
            execution: self.execution,
        })
    }
}
