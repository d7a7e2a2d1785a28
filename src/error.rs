//! Crate-wide error type and its mapping onto JSON-RPC error bodies.

use serde_json::{json, Value};

/// Literal text a tool/resource handler must use when it requires metadata
/// that has not finished its background load yet (§7, §8.2).
pub const DATABASE_NOT_READY: &str = "Database is still initializing";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Not yet able to serve the request — metadata still loading, or no
    /// database client configured for this caller (§4.4, §4.6).
    #[error("{0}")]
    NotReady(String),

    #[error("{0}")]
    Other(String),
}

impl ServerError {
    /// JSON-RPC error code this maps to when surfaced at the protocol layer.
    pub fn code(&self) -> i32 {
        match self {
            ServerError::Unauthorized => -32001,
            ServerError::InvalidParams(_) => -32602,
            ServerError::MethodNotFound(_) => -32601,
            ServerError::InvalidRequest(_) => -32600,
            ServerError::NotFound(_) | ServerError::NotReady(_) => -32603,
            _ => -32603,
        }
    }

    pub fn to_rpc_error(&self) -> Value {
        json!({ "code": self.code(), "message": self.to_string() })
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
