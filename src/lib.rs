//! # TradeForge SDK
//!
//! Async client core for the TradeForge trading-automation platform.
//!
//! Resource wrappers (labs, bots, accounts, scripts, markets, backtests,
//! orders) live above this crate; everything here is the shared machinery
//! they call through: admission control, retries, batching, caching, and
//! session management.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Policies & primitives** — `config`, `limiter`, `retry`, `cache`,
//!    `batch` (transport-free, always available)
//! 2. **Auth** — session state machine + pluggable `AuthTransport`
//! 3. **HTTP transport** — reqwest-backed `AuthTransport` (feature `http`)
//! 4. **High-Level Client** — `TradeForgeClient` facade built from presets
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tradeforge_sdk::prelude::*;
//!
//! let client = TradeForgeClient::builder()
//!     .base_url("https://api.tradeforge.io")
//!     .preset("balanced")
//!     .build()?;
//!
//! client.auth().authenticate(credentials).await?;
//! let labs = client.execute(|| fetch_labs()).await?;
//! ```

// ── Layer 1: Policies & primitives ───────────────────────────────────────────

/// Aggregate client policy + named presets.
pub mod config;

/// Token-bucket admission control.
pub mod limiter;

/// Exponential-backoff retry handling.
pub mod retry;

/// Expiring key/value store for idempotent reads.
pub mod cache;

/// Concurrency-bounded batch fan-out.
pub mod batch;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: credentials, sessions, the session state machine.
pub mod auth;

// ── Layer 3: HTTP transport ──────────────────────────────────────────────────

/// reqwest-backed `AuthTransport` implementation.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: High-Level Client ───────────────────────────────────────────────

/// `TradeForgeClient` — the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Policies
    pub use crate::batch::BatchPolicy;
    pub use crate::cache::CachePolicy;
    pub use crate::config::ClientPolicy;
    pub use crate::limiter::RateLimitPolicy;
    pub use crate::retry::RetryPolicy;

    // Primitives
    pub use crate::batch::BatchProcessor;
    pub use crate::cache::TtlCache;
    pub use crate::limiter::RateLimiter;
    pub use crate::retry::RetryHandler;

    // Auth
    pub use crate::auth::{
        AuthManager, AuthTransport, Credentials, LoginOutcome, Session, SessionState,
    };

    // Errors
    pub use crate::error::{AuthError, SdkError};

    // Network
    pub use crate::network::DEFAULT_API_URL;

    // High-level client
    pub use crate::client::{TradeForgeClient, TradeForgeClientBuilder};

    #[cfg(feature = "http")]
    pub use crate::error::HttpError;
    #[cfg(feature = "http")]
    pub use crate::http::HttpAuthTransport;
}
