//! Security-group forest.
//!
//! Each group has at most one parent. A caller assigned to group `A` satisfies
//! a requirement on group `G` when `A == G` or `A` is an ancestor of `G`; only
//! the required group's chain is walked, never descendants.

use std::collections::{HashMap, HashSet};

use comy_core::error::{ComyError, Result};

use crate::config::GroupConfig;

#[derive(Debug, Default)]
pub struct SecurityGroups {
    parents: HashMap<String, Option<String>>,
}

impl SecurityGroups {
    /// Build and validate the forest: unique names, known parents, no cycles.
    pub fn new<I, N, P>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Option<P>)>,
        N: Into<String>,
        P: Into<String>,
    {
        let mut parents = HashMap::new();
        for (name, parent) in groups {
            let name = name.into();
            if parents.contains_key(&name) {
                return Err(ComyError::DuplicateGroup(name));
            }
            parents.insert(name, parent.map(Into::into));
        }

        for parent in parents.values().flatten() {
            if !parents.contains_key(parent) {
                return Err(ComyError::UnknownGroup(parent.clone()));
            }
        }

        let groups = Self { parents };
        groups.reject_cycles()?;
        Ok(groups)
    }

    pub fn from_config(cfg: &[GroupConfig]) -> Result<Self> {
        Self::new(cfg.iter().map(|g| (g.name.clone(), g.parent.clone())))
    }

    fn reject_cycles(&self) -> Result<()> {
        for start in self.parents.keys() {
            let mut seen = HashSet::new();
            let mut cur = Some(start.as_str());
            while let Some(name) = cur {
                if !seen.insert(name) {
                    return Err(ComyError::GroupCycle(start.clone()));
                }
                cur = self.parent_of(name);
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.parents.get(name).and_then(|p| p.as_deref())
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// True if `caller` is `required` or one of its ancestors.
    ///
    /// The walk is bounded by the number of registered groups.
    pub fn reaches(&self, caller: &str, required: &str) -> bool {
        let mut cur = Some(required);
        for _ in 0..=self.parents.len() {
            match cur {
                Some(name) if name == caller => return true,
                Some(name) => cur = self.parent_of(name),
                None => return false,
            }
        }
        false
    }

    /// True if `caller` reaches any group of `required`.
    pub fn reaches_any(&self, caller: &str, required: &[String]) -> bool {
        required.iter().any(|g| self.reaches(caller, g))
    }
}
