//! Authentication — credentials, sessions, the session state machine.
//!
//! ## Security Model
//!
//! - The session key is held inside the manager and surfaced only through
//!   `get_auth_headers()` for request builders; consumers never mutate the
//!   session directly.
//! - The one-time-code step is an explicit two-phase protocol:
//!   `authenticate()` returns `AuthError::ChallengeRequired`, and the caller
//!   supplies the code later via `complete_authentication()` through whatever
//!   channel it controls (prompt, email poll, test harness). The core never
//!   blocks waiting on interactive input.
//! - `logout()` is best-effort on the remote side and unconditional locally.

pub mod manager;

pub use manager::AuthManager;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthError;

/// Header carrying the session's user identifier.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the session key.
pub const SESSION_KEY_HEADER: &str = "X-Session-Key";

// ============================================================================
// Credentials & session
// ============================================================================

/// A credential pair for the initial exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// The password never appears in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated identity/key pair, valid for a bounded time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub session_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

impl Session {
    /// Whether the local clock has reached `expires_at`.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// A session is usable iff it is active and not expired.
    pub fn is_usable(&self) -> bool {
        self.active && !self.is_expired()
    }
}

/// The authentication state machine.
///
/// Expiry is derived from the session's clock, not stored as a variant:
/// an `Authenticated` session whose `expires_at` has passed reports
/// `is_usable() == false`.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    AwaitingChallenge { challenge_id: String },
    Authenticated(Session),
    Failed,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Result of an initial credential exchange.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The platform granted a session outright.
    Granted(Session),
    /// The platform requires a one-time code; complete with
    /// `AuthManager::complete_authentication`.
    ChallengeRequired { challenge_id: String },
}

/// The wire operations the session state machine needs.
///
/// Implemented over HTTP by `http::HttpAuthTransport`; test harnesses supply
/// their own.
#[allow(async_fn_in_trait)]
pub trait AuthTransport: Send + Sync {
    /// Initial credential exchange.
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, AuthError>;

    /// Second phase of a challenged login.
    async fn complete_login(
        &self,
        credentials: &Credentials,
        challenge_id: &str,
        code: &str,
    ) -> Result<Session, AuthError>;

    /// Exchange the current session key for a renewed one. Same identity,
    /// new fixed-window expiry.
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError>;

    /// Lightweight liveness check — detects silent server-side invalidation.
    async fn probe(&self, session: &Session) -> bool;

    /// Remote session invalidation.
    async fn logout(&self, session: &Session) -> Result<(), AuthError>;
}

// ============================================================================
// Wire types
// ============================================================================

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session payload as the platform returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWire {
    pub user_id: String,
    pub session_key: String,
    pub expires_at: i64,
}

impl SessionWire {
    pub fn into_session(self) -> Session {
        Session {
            user_id: self.user_id,
            session_key: self.session_key,
            created_at: Utc::now(),
            expires_at: parse_expires_at(self.expires_at),
            active: true,
        }
    }
}

/// Login response: either a granted session or a challenge to complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub session: Option<SessionWire>,
    #[serde(default)]
    pub challenge_id: Option<String>,
}

/// Second-phase request body for a challenged login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteLoginRequest {
    pub email: String,
    pub challenge_id: String,
    pub code: String,
}

/// Refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub session_key: String,
}

fn parse_expires_at(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
