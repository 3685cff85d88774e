//! Axum HTTP handlers for the web server
//!
//! Liveness and discovery endpoints; the JSON-RPC route itself is installed
//! by [`crate::rpc::RpcRoute`].

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub rpc_endpoint: String,
    pub rpc_method: String,
    pub media_type: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rpc_endpoint: state.config.rpc_path.clone(),
        rpc_method: state.config.rpc_method.to_string(),
        media_type: state.config.media_type.clone(),
    })
}
