//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Authentication errors.
///
/// The only failure family that must propagate to callers — no request can
/// proceed without a valid session.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    /// The platform requires a one-time code delivered out-of-band.
    /// Supply it via `AuthManager::complete_authentication`.
    #[error("secondary verification required (challenge {challenge_id})")]
    ChallengeRequired { challenge_id: String },

    #[error("one-time code rejected: {0}")]
    ChallengeFailed(String),

    /// The session passed its local expiry; refresh is refused without a
    /// remote call.
    #[error("session expired")]
    SessionExpired,

    #[error("session refresh failed: {0}")]
    RefreshFailed(String),

    #[error("logout failed: {0}")]
    LogoutFailed(String),
}

/// HTTP transport errors.
#[cfg(feature = "http")]
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("timeout")]
    Timeout,
}
