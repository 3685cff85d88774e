use std::{env, net::SocketAddr};

use axum::http::Method;
use thiserror::Error;

use crate::rpc::{media::HeaderMatcher, AdapterSettings};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub rpc_path: String,
    pub rpc_method: Method,
    pub media_type: String,
    pub inactivity_timeout: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("JSONRPC_PATH must start with '/'")]
    InvalidPath,
    #[error("JSONRPC_METHOD and JSONRPC_PATH clash with a built-in route")]
    ReservedRoute,
    #[error("JSONRPC_METHOD must be GET or POST")]
    InvalidMethod,
    #[error("JSONRPC_MEDIA_TYPE must look like type/subtype")]
    InvalidMediaType,
    #[error("JSONRPC_INACTIVITY_TIMEOUT must be a positive number of seconds")]
    InvalidInactivityTimeout,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let rpc_path = non_empty_var("JSONRPC_PATH").unwrap_or_else(|| "/rpc".to_string());
        if !rpc_path.starts_with('/') {
            return Err(ConfigError::InvalidPath);
        }

        let rpc_method = match non_empty_var("JSONRPC_METHOD")
            .map(|value| value.to_ascii_uppercase())
            .as_deref()
        {
            None | Some("POST") => Method::POST,
            Some("GET") => Method::GET,
            Some(_) => return Err(ConfigError::InvalidMethod),
        };

        if crate::collides_with_builtin_routes(&rpc_method, &rpc_path) {
            return Err(ConfigError::ReservedRoute);
        }

        let media_type = non_empty_var("JSONRPC_MEDIA_TYPE")
            .unwrap_or_else(|| crate::rpc::media::DEFAULT_MEDIA_TYPE.to_string());
        HeaderMatcher::new(&media_type).map_err(|_| ConfigError::InvalidMediaType)?;

        let inactivity_timeout = non_empty_var("JSONRPC_INACTIVITY_TIMEOUT")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|seconds| *seconds > 0)
                    .ok_or(ConfigError::InvalidInactivityTimeout)
            })
            .transpose()?;

        let config = Self {
            bind_addr,
            bind_port,
            rpc_path,
            rpc_method,
            media_type,
            inactivity_timeout,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            media_type: self.media_type.clone(),
            inactivity_timeout: self.inactivity_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            bind_port: 8080,
            rpc_path: "/rpc".to_string(),
            rpc_method: Method::POST,
            media_type: crate::rpc::media::DEFAULT_MEDIA_TYPE.to_string(),
            inactivity_timeout: None,
        }
    }
}
