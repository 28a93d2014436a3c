//! Network URL constants for the TradeForge SDK.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.tradeforge.io";
