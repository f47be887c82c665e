//! Authorization gate.
//!
//! A command with no required groups is public. Otherwise the caller must
//! resolve to a user whose group reaches one of the required groups. On an
//! unsecured server the same computation runs (so identity and expiry
//! diagnostics reach the response) but never blocks.

use std::sync::Arc;

use crate::auth::groups::SecurityGroups;
use crate::auth::tokens::{TokenService, TokenVerification};
use crate::auth::users::User;

/// Outcome of an authorization check.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub allowed: bool,
    /// Present iff a token was supplied.
    pub verification: Option<TokenVerification>,
}

impl Authorization {
    pub fn user(&self) -> Option<&Arc<User>> {
        self.verification.as_ref().and_then(TokenVerification::user)
    }

    pub fn token_expired(&self) -> bool {
        self.verification
            .as_ref()
            .is_some_and(TokenVerification::is_expired)
    }
}

pub struct Authorizer {
    secured: bool,
    tokens: Arc<TokenService>,
    groups: Arc<SecurityGroups>,
}

impl Authorizer {
    pub fn new(secured: bool, tokens: Arc<TokenService>, groups: Arc<SecurityGroups>) -> Self {
        Self {
            secured,
            tokens,
            groups,
        }
    }

    pub fn is_secured(&self) -> bool {
        self.secured
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Verify `token` (if any) once; callers checking many commands reuse it.
    pub fn verify(&self, token: Option<&str>) -> Option<TokenVerification> {
        token.map(|t| self.tokens.verify(t))
    }

    pub fn authorize(&self, token: Option<&str>, required_groups: &[String]) -> Authorization {
        let verification = self.verify(token);
        let allowed = self.permits(verification.as_ref(), required_groups);
        Authorization {
            allowed,
            verification,
        }
    }

    /// The gate itself, given an already verified token.
    pub fn permits(&self, verification: Option<&TokenVerification>, required_groups: &[String]) -> bool {
        if required_groups.is_empty() || !self.secured {
            return true;
        }

        let Some(user) = verification.and_then(TokenVerification::user) else {
            return false;
        };
        user.group
            .as_deref()
            .is_some_and(|g| self.groups.reaches_any(g, required_groups))
    }
}
