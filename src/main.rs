use std::sync::Arc;

use async_trait::async_trait;
use jsonrpc_http_adapter::{
    build_app,
    config::Config,
    logging,
    rpc::{EngineError, RpcEngine},
    AppState,
};
use serde_json::{json, Value};
use tracing::info;

/// Answers every call with its own `params`; stands in for a real engine.
struct ReflectEngine;

#[async_trait]
impl RpcEngine for ReflectEngine {
    async fn execute(&self, request: Value) -> Result<Option<Value>, EngineError> {
        let Some(call) = request.as_object() else {
            let (code, message) = if request.is_null() {
                (-32700, "Parse error")
            } else {
                (-32600, "Invalid Request")
            };
            return Ok(Some(json!({
                "jsonrpc": "2.0",
                "error": { "code": code, "message": message },
                "id": null
            })));
        };

        let Some(id) = call.get("id") else {
            return Ok(None);
        };

        Ok(Some(json!({
            "jsonrpc": "2.0",
            "result": call.get("params").cloned().unwrap_or(Value::Null),
            "id": id
        })))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.clone(), Arc::new(ReflectEngine));
    let app = build_app(state)?;
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        rpc_method = %config.rpc_method,
        rpc_path = %config.rpc_path,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
