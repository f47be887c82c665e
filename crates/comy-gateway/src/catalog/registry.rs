//! Command registry.
//!
//! The catalog is an immutable snapshot behind a read-mostly lock; readers
//! clone the `Arc` and never observe a half-applied replace.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use comy_core::error::{ComyError, Result};

use crate::catalog::command::Command;

/// Validated, immutable set of commands (registration order preserved).
#[derive(Debug, Default)]
pub struct Catalog {
    order: Vec<Arc<Command>>,
    by_name: HashMap<String, Arc<Command>>,
}

impl Catalog {
    /// Fails if any two commands share a name.
    pub fn new(commands: Vec<Command>) -> Result<Self> {
        Self::from_shared(commands.into_iter().map(Arc::new).collect())
    }

    fn from_shared(order: Vec<Arc<Command>>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(order.len());
        for cmd in &order {
            if by_name
                .insert(cmd.name().to_owned(), Arc::clone(cmd))
                .is_some()
            {
                return Err(ComyError::DuplicateCommand(cmd.name().to_owned()));
            }
        }
        Ok(Self { order, by_name })
    }

    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.by_name.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.order.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    catalog: RwLock<Arc<Catalog>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands(commands: Vec<Command>) -> Result<Self> {
        Ok(Self {
            catalog: RwLock::new(Arc::new(Catalog::new(commands)?)),
        })
    }

    /// Add commands to the catalog. Nothing changes if any name collides.
    pub fn register(&self, commands: Vec<Command>) -> Result<()> {
        let mut guard = self.catalog.write();
        let merged: Vec<Arc<Command>> = guard
            .iter()
            .cloned()
            .chain(commands.into_iter().map(Arc::new))
            .collect();
        *guard = Arc::new(Catalog::from_shared(merged)?);
        Ok(())
    }

    /// Swap the whole catalog. Nothing changes if any name collides.
    pub fn replace(&self, commands: Vec<Command>) -> Result<()> {
        let next = Arc::new(Catalog::new(commands)?);
        *self.catalog.write() = next;
        Ok(())
    }

    /// Consistent view for the duration of one request.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog.read())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.catalog.read().get(name)
    }
}
