//! Binding a JSON-RPC engine to one path and one HTTP method.
//!
//! Each matching request goes through header validation, payload
//! extraction, a single engine call and the status mapping:
//! a payload becomes `200`, no payload becomes `204`, and header mismatches
//! are rejected with an empty `415` before the engine is ever involved.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{
        header::{ACCEPT, ALLOW, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tower::ServiceExt;
use tracing::{debug, info_span, Instrument};

use crate::errors::{AppError, BindError};
use crate::rpc::{
    engine::{EngineError, RpcEngine},
    envelope,
    media::{HeaderMatcher, DEFAULT_MEDIA_TYPE},
};

pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    pub media_type: String,
    /// Per-application override of [`DEFAULT_INACTIVITY_TIMEOUT_SECS`].
    pub inactivity_timeout: Option<u64>,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            inactivity_timeout: None,
        }
    }
}

/// Idle time the connection may sit without traffic while the engine works.
///
/// Attached to every dispatched response. axum offers no per-connection idle
/// timer, so hosts that have one read it from here; the adapter itself never
/// cancels an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityTimeout(pub Duration);

pub struct RpcRoute {
    method: Method,
    path: String,
    engine: Arc<dyn RpcEngine>,
    matcher: HeaderMatcher,
    response_content_type: HeaderValue,
    inactivity_timeout: Option<u64>,
    fallback: Option<MethodRouter>,
}

struct RouteState {
    method: Method,
    engine: Arc<dyn RpcEngine>,
    matcher: HeaderMatcher,
    response_content_type: HeaderValue,
    inactivity_timeout: Option<u64>,
    fallback: Option<MethodRouter>,
}

/// Installs `engine` on `router` at `path` with the default settings.
///
/// # Errors
///
/// Returns [`BindError`] for a method other than GET or POST, or a path axum
/// cannot route.
///
/// # Panics
///
/// Panics when `router` already has a handler for the same method and path.
pub fn bind<S>(
    router: Router<S>,
    method: Method,
    path: &str,
    engine: Arc<dyn RpcEngine>,
) -> Result<Router<S>, BindError>
where
    S: Clone + Send + Sync + 'static,
{
    Ok(RpcRoute::new(method, path, engine)?.mount(router))
}

impl RpcRoute {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        engine: Arc<dyn RpcEngine>,
    ) -> Result<Self, BindError> {
        if method != Method::POST && method != Method::GET {
            return Err(BindError::UnsupportedMethod(method.to_string()));
        }

        let path = path.into();
        if !is_routable_path(&path) {
            return Err(BindError::InvalidPath(path));
        }

        let matcher = HeaderMatcher::new(DEFAULT_MEDIA_TYPE)?;
        let response_content_type = HeaderValue::from_static(DEFAULT_MEDIA_TYPE);

        Ok(Self {
            method,
            path,
            engine,
            matcher,
            response_content_type,
            inactivity_timeout: None,
            fallback: None,
        })
    }

    pub fn with_settings(mut self, settings: AdapterSettings) -> Result<Self, BindError> {
        let matcher = HeaderMatcher::new(&settings.media_type)?;
        self.response_content_type = HeaderValue::from_str(matcher.media_type())
            .map_err(|_| BindError::InvalidMediaType(settings.media_type.clone()))?;
        self.matcher = matcher;
        self.inactivity_timeout = settings.inactivity_timeout;
        Ok(self)
    }

    /// Serves requests whose headers do not negotiate the JSON-RPC media type
    /// with `fallback` instead of rejecting them, so the path can be shared
    /// with another handler.
    pub fn with_fallback(mut self, fallback: MethodRouter) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Installs the route on `router`.
    ///
    /// # Panics
    ///
    /// Panics when `router` already has a handler for the same method and path.
    pub fn mount<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let state = Arc::new(RouteState {
            method: self.method.clone(),
            engine: self.engine,
            matcher: self.matcher,
            response_content_type: self.response_content_type,
            inactivity_timeout: self.inactivity_timeout,
            fallback: self.fallback,
        });

        let handler = move |request: Request| {
            let state = Arc::clone(&state);
            async move { handle(state, request).await }
        };

        // axum routes HEAD to the GET endpoint unless HEAD has its own.
        let method_router = if self.method == Method::GET {
            on(MethodFilter::GET, handler).on(MethodFilter::HEAD, head_not_allowed)
        } else {
            on(MethodFilter::POST, handler)
        };

        router.route(&self.path, method_router)
    }
}

async fn head_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "GET")])
}

/// Paths axum accepts: absolute, no empty segments except a trailing slash,
/// captures only as whole `{name}` segments and a wildcard `{*name}` only last.
fn is_routable_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    segments.iter().enumerate().all(|(index, segment)| {
        if segment.is_empty() {
            return index == last && index > 0;
        }
        if segment.starts_with(':') || segment.starts_with('*') {
            return false;
        }
        if !segment.contains(['{', '}']) {
            return true;
        }
        let Some(capture) = segment
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
        else {
            return false;
        };
        let name = match capture.strip_prefix('*') {
            Some(name) if index == last => name,
            Some(_) => return false,
            None => capture,
        };
        !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    })
}

impl RouteState {
    fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout.unwrap_or(DEFAULT_INACTIVITY_TIMEOUT_SECS))
    }

    fn mismatched_header(&self, headers: &HeaderMap) -> Option<&'static str> {
        let value = |name: HeaderName| headers.get(name).and_then(|value| value.to_str().ok());

        if !self.matcher.content_type_matches(value(CONTENT_TYPE)) {
            return Some("content-type");
        }
        if !self.matcher.accept_matches(value(ACCEPT)) {
            return Some("accept");
        }
        None
    }

    async fn reject(&self, request: Request, header: &'static str) -> Response {
        if let Some(fallback) = &self.fallback {
            debug!(header, "headers did not match, using fallback route");
            return fallback
                .clone()
                .oneshot(request)
                .await
                .unwrap_or_else(|never| match never {});
        }

        AppError::unsupported_media_type(header, self.matcher.media_type()).into_response()
    }
}

async fn handle(state: Arc<RouteState>, request: Request) -> Response {
    if let Some(header) = state.mismatched_header(request.headers()) {
        return state.reject(request, header).await;
    }

    let timeout = state.inactivity_timeout();
    let span = info_span!(
        "jsonrpc",
        method = %state.method,
        path = %request.uri().path(),
        inactivity_timeout_secs = timeout.as_secs(),
    );

    async move {
        let payload = if state.method == Method::GET {
            envelope::from_query(request.uri())
        } else {
            match Bytes::from_request(request, &()).await {
                Ok(body) => envelope::from_body(&body),
                Err(rejection) => return rejection.into_response(),
            }
        };

        let engine = Arc::clone(&state.engine);
        // A dropped handler future (client gone) must not cancel the engine.
        let task = tokio::spawn(async move { engine.execute(payload).await }.in_current_span());

        let reply = match task.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => return AppError::from(err).into_response(),
            Err(join) if join.is_panic() => {
                return AppError::from(EngineError::Panicked).into_response()
            }
            Err(join) => return AppError::internal(join.to_string()).into_response(),
        };

        let mut response = match reply {
            Some(payload) => match serde_json::to_vec(&payload) {
                Ok(body) => (StatusCode::OK, body).into_response(),
                Err(err) => {
                    return AppError::internal(format!("failed to encode engine reply: {err}"))
                        .into_response()
                }
            },
            None => StatusCode::NO_CONTENT.into_response(),
        };

        debug!(status = response.status().as_u16(), "engine completed");
        response
            .headers_mut()
            .insert(CONTENT_TYPE, state.response_content_type.clone());
        response.extensions_mut().insert(InactivityTimeout(timeout));
        response
    }
    .instrument(span)
    .await
}
