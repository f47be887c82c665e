//! Authentication and authorization.
//!
//! - `groups`: security-group forest and the ancestor-chain permission walk.
//! - `users`: in-memory user directory.
//! - `tokens`: signed access/refresh tokens and refresh-secret rotation.
//! - `authorize`: the authorization gate applied to every command.

pub mod authorize;
pub mod groups;
pub mod tokens;
pub mod users;

pub use authorize::{Authorization, Authorizer};
pub use groups::SecurityGroups;
pub use tokens::{AuthenticationOutcome, TokenService, TokenVerification};
pub use users::{Caller, User, UserDirectory};
