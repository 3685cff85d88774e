use std::sync::Arc;

use axum::{http::Method, middleware, routing::get, Router};

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod rpc;

use config::Config;
use errors::BindError;
use rpc::{RpcEngine, RpcRoute};

pub const HEALTH_PATH: &str = "/health";
pub const DISCOVERY_PATH: &str = "/.well-known/jsonrpc";

/// Whether a JSON-RPC route would shadow one of the built-in GET routes.
pub fn collides_with_builtin_routes(method: &Method, path: &str) -> bool {
    method == Method::GET && (path == HEALTH_PATH || path == DISCOVERY_PATH)
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<dyn RpcEngine>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<dyn RpcEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}

pub fn build_app(state: AppState) -> Result<Router, BindError> {
    if collides_with_builtin_routes(&state.config.rpc_method, &state.config.rpc_path) {
        return Err(BindError::RouteConflict(format!(
            "{} {}",
            state.config.rpc_method, state.config.rpc_path
        )));
    }

    let rpc = RpcRoute::new(
        state.config.rpc_method.clone(),
        state.config.rpc_path.clone(),
        Arc::clone(&state.engine),
    )?
    .with_settings(state.config.adapter_settings())?;

    let router = Router::new()
        .route(HEALTH_PATH, get(http::handlers::health))
        .route(DISCOVERY_PATH, get(http::handlers::discovery));

    Ok(rpc
        .mount(router)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state))
}
