//! In-memory user directory, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use comy_core::error::{ComyError, Result};

use crate::auth::groups::SecurityGroups;
use crate::config::UserConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    pub group: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>, group: Option<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            group,
        }
    }

    /// Identity handed to command bodies (no credentials).
    pub fn caller(&self) -> Caller {
        Caller {
            username: self.username.clone(),
            group: self.group.clone(),
        }
    }
}

/// Resolved identity of whoever triggered a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub username: String,
    pub group: Option<String>,
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, Arc<User>>,
}

impl UserDirectory {
    /// Every user's group must be registered; usernames are unique.
    pub fn new(users: impl IntoIterator<Item = User>, groups: &SecurityGroups) -> Result<Self> {
        let mut out = HashMap::new();
        for user in users {
            if let Some(group) = &user.group {
                if !groups.contains(group) {
                    return Err(ComyError::UnknownGroup(group.clone()));
                }
            }
            if out.contains_key(&user.username) {
                return Err(ComyError::DuplicateUser(user.username));
            }
            out.insert(user.username.clone(), Arc::new(user));
        }
        Ok(Self { users: out })
    }

    pub fn from_config(cfg: &[UserConfig], groups: &SecurityGroups) -> Result<Self> {
        Self::new(
            cfg.iter()
                .map(|u| User::new(u.username.clone(), u.password.clone(), u.group.clone())),
            groups,
        )
    }

    pub fn get(&self, username: &str) -> Option<Arc<User>> {
        self.users.get(username).cloned()
    }

    /// Look up `username` and compare the password by equality.
    pub fn check_credentials(&self, username: &str, password: &str) -> Option<Arc<User>> {
        self.get(username).filter(|u| u.password == password)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unregistered_group_and_duplicates() {
        let groups = SecurityGroups::new([("Member", None::<&str>)]).unwrap();

        let err = UserDirectory::new([User::new("bob", "pw", Some("Admin".into()))], &groups)
            .unwrap_err();
        assert!(matches!(err, ComyError::UnknownGroup(_)));

        let err = UserDirectory::new(
            [User::new("bob", "pw", None), User::new("bob", "other", None)],
            &groups,
        )
        .unwrap_err();
        assert!(matches!(err, ComyError::DuplicateUser(ref u) if u == "bob"));
    }

    #[test]
    fn credentials_compare_by_equality() {
        let groups = SecurityGroups::default();
        let dir = UserDirectory::new([User::new("bob", "pw", None)], &groups).unwrap();
        assert!(dir.check_credentials("bob", "pw").is_some());
        assert!(dir.check_credentials("bob", "PW").is_none());
        assert!(dir.check_credentials("alice", "pw").is_none());
    }
}
