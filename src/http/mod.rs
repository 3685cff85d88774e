//! Auxiliary HTTP endpoints
//!
//! Liveness and discovery routes served next to the JSON-RPC endpoint.

pub mod handlers;
