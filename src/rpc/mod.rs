//! JSON-RPC 2.0 over HTTP
//!
//! Binds an externally supplied RPC engine to a route: content negotiation,
//! payload extraction from the body or query string, and the mapping of the
//! engine's reply onto an HTTP status.

pub mod engine;
pub mod envelope;
pub mod media;
pub mod route;

pub use engine::{Callback, CallbackEngine, Completion, EngineError, RpcEngine};
pub use route::{
    bind, AdapterSettings, InactivityTimeout, RpcRoute, DEFAULT_INACTIVITY_TIMEOUT_SECS,
};
