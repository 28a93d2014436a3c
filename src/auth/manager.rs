//! Session state machine — `AuthManager`.

use async_lock::{Mutex, RwLock};

use crate::auth::{
    AuthTransport, Credentials, LoginOutcome, Session, SessionState, SESSION_KEY_HEADER,
    USER_ID_HEADER,
};
use crate::error::AuthError;

/// Drives the session lifecycle against a pluggable transport.
///
/// A single internal mutex serializes every authenticate/refresh operation,
/// so at most one is in flight per manager instance at any time. Concurrent
/// `ensure_authenticated()` callers queue on that mutex and observe the
/// session the first caller established.
pub struct AuthManager<T: AuthTransport> {
    transport: T,
    state: RwLock<SessionState>,
    credentials: RwLock<Option<Credentials>>,
    /// Serializes login/refresh/logout round-trips.
    op_lock: Mutex<()>,
}

impl<T: AuthTransport> AuthManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: RwLock::new(SessionState::Unauthenticated),
            credentials: RwLock::new(None),
            op_lock: Mutex::new(()),
        }
    }

    /// Pre-store credentials so `ensure_authenticated()` can log in on
    /// demand without an explicit `authenticate()` call.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        *self.credentials.get_mut() = Some(credentials);
        self
    }

    /// Restore a previously persisted session.
    pub fn with_session(mut self, session: Session) -> Self {
        *self.state.get_mut() = SessionState::Authenticated(session);
        self
    }

    /// Perform the initial credential exchange.
    ///
    /// If the platform requires a one-time code, the manager transitions to
    /// `AwaitingChallenge` and returns `AuthError::ChallengeRequired`; the
    /// caller supplies the code later via `complete_authentication`.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let _op = self.op_lock.lock().await;
        *self.credentials.write().await = Some(credentials.clone());
        self.login_locked(&credentials).await
    }

    /// Second phase of a challenged login.
    pub async fn complete_authentication(
        &self,
        credentials: Credentials,
        code: &str,
    ) -> Result<Session, AuthError> {
        let _op = self.op_lock.lock().await;
        let challenge_id = match &*self.state.read().await {
            SessionState::AwaitingChallenge { challenge_id } => challenge_id.clone(),
            _ => {
                return Err(AuthError::ChallengeFailed(
                    "no challenge pending".to_string(),
                ))
            }
        };
        *self.credentials.write().await = Some(credentials.clone());

        match self
            .transport
            .complete_login(&credentials, &challenge_id, code)
            .await
        {
            Ok(session) => {
                tracing::info!(user_id = %session.user_id, "challenge solved, session established");
                *self.state.write().await = SessionState::Authenticated(session.clone());
                Ok(session)
            }
            Err(e) => {
                *self.state.write().await = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Three-tier fallback: reuse the current session when a probe confirms
    /// it live, else refresh, else re-authenticate with stored credentials.
    ///
    /// Minimizes redundant logins while tolerating silent server-side
    /// invalidation.
    pub async fn ensure_authenticated(&self) -> Result<Session, AuthError> {
        let _op = self.op_lock.lock().await;

        if let Some(session) = self.session_snapshot().await {
            if session.is_usable() && self.transport.probe(&session).await {
                return Ok(session);
            }
            match self.refresh_locked().await {
                Ok(renewed) => return Ok(renewed),
                Err(e) => {
                    tracing::debug!(error = %e, "session refresh failed, re-authenticating");
                }
            }
        }

        let credentials = self
            .credentials
            .read()
            .await
            .clone()
            .ok_or(AuthError::NotAuthenticated)?;
        self.login_locked(&credentials).await
    }

    /// Exchange the current session key for a renewed one.
    ///
    /// Fails with `AuthError::SessionExpired` — without a remote call — when
    /// the local expiry has already passed.
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let _op = self.op_lock.lock().await;
        self.refresh_locked().await
    }

    /// Best-effort remote invalidation followed by unconditional local
    /// clearing. Never raises.
    pub async fn logout(&self) {
        let _op = self.op_lock.lock().await;
        if let Some(session) = self.session_snapshot().await {
            if let Err(e) = self.transport.logout(&session).await {
                tracing::warn!(error = %e, "remote logout failed, clearing local session anyway");
            }
        }
        *self.state.write().await = SessionState::Unauthenticated;
        *self.credentials.write().await = None;
        tracing::info!("session cleared");
    }

    /// Drop the local session without a remote call. Stored credentials are
    /// kept, so `ensure_authenticated()` can log in again.
    pub async fn invalidate(&self) {
        *self.state.write().await = SessionState::Unauthenticated;
    }

    /// True iff a session exists, is marked active, and the local clock is
    /// before its expiry.
    pub async fn is_authenticated(&self) -> bool {
        self.session_snapshot()
            .await
            .map(|s| s.is_usable())
            .unwrap_or(false)
    }

    /// The current session, if one is established (possibly expired).
    pub async fn session(&self) -> Option<Session> {
        self.session_snapshot().await
    }

    /// A snapshot of the state machine, for observability and tests.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// The two session-identifying headers attached to every outbound
    /// request.
    pub async fn get_auth_headers(&self) -> Result<[(&'static str, String); 2], AuthError> {
        let session = self
            .session_snapshot()
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        if !session.is_usable() {
            return Err(AuthError::SessionExpired);
        }
        Ok([
            (USER_ID_HEADER, session.user_id),
            (SESSION_KEY_HEADER, session.session_key),
        ])
    }

    // ── Internals (op_lock held by the caller) ───────────────────────────

    async fn login_locked(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        *self.state.write().await = SessionState::Authenticating;
        match self.transport.login(credentials).await {
            Ok(LoginOutcome::Granted(session)) => {
                tracing::info!(user_id = %session.user_id, "session established");
                *self.state.write().await = SessionState::Authenticated(session.clone());
                Ok(session)
            }
            Ok(LoginOutcome::ChallengeRequired { challenge_id }) => {
                tracing::info!(%challenge_id, "secondary verification required");
                *self.state.write().await = SessionState::AwaitingChallenge {
                    challenge_id: challenge_id.clone(),
                };
                Err(AuthError::ChallengeRequired { challenge_id })
            }
            Err(e) => {
                *self.state.write().await = SessionState::Failed;
                Err(e)
            }
        }
    }

    async fn refresh_locked(&self) -> Result<Session, AuthError> {
        let current = self
            .session_snapshot()
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        if current.is_expired() {
            // Local check only; a dead session is never sent to the server.
            *self.state.write().await = SessionState::Unauthenticated;
            return Err(AuthError::SessionExpired);
        }
        match self.transport.refresh(&current).await {
            Ok(renewed) => {
                tracing::info!(user_id = %renewed.user_id, "session refreshed");
                *self.state.write().await = SessionState::Authenticated(renewed.clone());
                Ok(renewed)
            }
            Err(e) => {
                *self.state.write().await = SessionState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn session_snapshot(&self) -> Option<Session> {
        self.state.read().await.session().cloned()
    }
}
