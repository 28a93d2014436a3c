//! HTTP transport layer — reqwest-backed `AuthTransport`.

pub mod transport;

pub use transport::HttpAuthTransport;
