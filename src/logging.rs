use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::rpc::InactivityTimeout;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// One summary line per request. Header rejections are logged where the
/// 415 is produced, see [`crate::errors::AppError`].
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let elapsed_ms = started_at.elapsed().as_millis();
    let inactivity_timeout_secs = response
        .extensions()
        .get::<InactivityTimeout>()
        .map(|InactivityTimeout(timeout)| timeout.as_secs());

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = elapsed_ms,
        inactivity_timeout_secs,
        "request summary"
    );

    response
}
