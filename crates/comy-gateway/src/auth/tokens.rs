//! Token service: HS256-signed access and refresh tokens.
//!
//! Tokens are compact JWS strings: `b64(header).b64(claims).b64(hmac)`, all
//! base64url without padding. An access token carries the subject identity
//! and a short expiry. A refresh token also carries the refresh secret that
//! was current when it was minted; every login rotates that secret, so only
//! refresh tokens from the latest login stay usable.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use comy_core::error::{ComyError, Result};

use crate::auth::users::{User, UserDirectory};

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

const REFRESH_SECRET_LEN: usize = 32;
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    iss: String,
    id: String,
    exp: u64,
    #[serde(rename = "refreshKey", default, skip_serializing_if = "Option::is_none")]
    refresh_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("unexpected issuer")]
    WrongIssuer,
    #[error("token expired")]
    Expired,
}

/// Result of verifying an access token. Failure reasons are exclusive.
#[derive(Debug, Clone)]
pub enum TokenVerification {
    Valid(Arc<User>),
    Expired,
    UserNotFound,
    /// Bad structure, signature, issuer, or claims.
    Invalid,
}

impl TokenVerification {
    pub fn user(&self) -> Option<&Arc<User>> {
        match self {
            TokenVerification::Valid(u) => Some(u),
            _ => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TokenVerification::Expired)
    }

    pub fn is_user_not_found(&self) -> bool {
        matches!(self, TokenVerification::UserNotFound)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TokenVerification::Invalid)
    }
}

/// Result of a username/password login.
#[derive(Debug, Clone)]
pub enum AuthenticationOutcome {
    Authenticated {
        access_token: String,
        refresh_token: String,
        username: String,
    },
    WrongCredentials,
}

/// Per-user authentication state owned by the token service.
#[derive(Debug, Default)]
struct AuthState {
    refresh_secret: Option<String>,
}

pub struct TokenService {
    key: Vec<u8>,
    issuer: String,
    users: Arc<UserDirectory>,
    auth_state: DashMap<String, Mutex<AuthState>>,
}

impl TokenService {
    pub fn new(secret_key: impl AsRef<[u8]>, issuer: impl Into<String>, users: Arc<UserDirectory>) -> Self {
        Self {
            key: secret_key.as_ref().to_vec(),
            issuer: issuer.into(),
            users,
            auth_state: DashMap::new(),
        }
    }

    /// Rotate the user's refresh secret and mint a fresh token pair.
    pub fn issue_tokens(&self, user: &User) -> Result<(String, String)> {
        let now = now_secs();
        let secret = generate_refresh_secret();

        let access = self.sign(&Claims {
            iss: self.issuer.clone(),
            id: user.username.clone(),
            exp: now + ACCESS_TOKEN_TTL.as_secs(),
            refresh_key: None,
        })?;
        let refresh = self.sign(&Claims {
            iss: self.issuer.clone(),
            id: user.username.clone(),
            exp: now + REFRESH_TOKEN_TTL.as_secs(),
            refresh_key: Some(secret.clone()),
        })?;

        // Last writer wins for concurrent logins of the same user.
        let state = self.auth_state.entry(user.username.clone()).or_default();
        state.lock().refresh_secret = Some(secret);

        Ok((access, refresh))
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticationOutcome> {
        let Some(user) = self.users.check_credentials(username, password) else {
            tracing::debug!(%username, "wrong credentials");
            return Ok(AuthenticationOutcome::WrongCredentials);
        };

        let (access_token, refresh_token) = self.issue_tokens(&user)?;
        tracing::info!(%username, "user authenticated");
        Ok(AuthenticationOutcome::Authenticated {
            access_token,
            refresh_token,
            username: user.username.clone(),
        })
    }

    /// Verify an access token and resolve its subject.
    pub fn verify(&self, token: &str) -> TokenVerification {
        let claims = match self.decode(token) {
            Ok(c) => c,
            Err(TokenError::Expired) => return TokenVerification::Expired,
            Err(e) => {
                tracing::debug!(error = %e, "access token rejected");
                return TokenVerification::Invalid;
            }
        };

        // refresh tokens are not bearer credentials
        if claims.refresh_key.is_some() {
            return TokenVerification::Invalid;
        }

        match self.users.get(&claims.id) {
            Some(user) => TokenVerification::Valid(user),
            None => TokenVerification::UserNotFound,
        }
    }

    /// Mint a new access token if `refresh_token` carries the user's current
    /// refresh secret. The refresh token itself is not rotated here.
    pub fn refresh(&self, refresh_token: &str) -> Option<String> {
        let claims = match self.decode(refresh_token) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "refresh token rejected");
                return None;
            }
        };
        let presented = claims.refresh_key?;
        let user = self.users.get(&claims.id)?;

        let current_matches = self
            .auth_state
            .get(&user.username)
            .map(|state| state.lock().refresh_secret.as_deref() == Some(presented.as_str()))
            .unwrap_or(false);
        if !current_matches {
            tracing::debug!(username = %user.username, "refresh secret superseded");
            return None;
        }

        self.sign(&Claims {
            iss: self.issuer.clone(),
            id: user.username.clone(),
            exp: now_secs() + ACCESS_TOKEN_TTL.as_secs(),
            refresh_key: None,
        })
        .map_err(|e| tracing::error!(error = %e, "access token signing failed"))
        .ok()
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| ComyError::Internal(format!("hmac key rejected: {e}")))
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| ComyError::Internal(format!("claims encode failed: {e}")))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let sig = mac.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(sig)))
    }

    fn decode(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let sig = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac().map_err(|_| TokenError::BadSignature)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&sig).map_err(|_| TokenError::BadSignature)?;

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::Malformed);
        }

        let claims: Claims = decode_segment(payload)?;
        if claims.iss != self.issuer {
            return Err(TokenError::WrongIssuer);
        }
        if claims.exp <= now_secs() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> std::result::Result<T, TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)
}

fn generate_refresh_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_SECRET_LEN)
        .map(char::from)
        .collect()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
