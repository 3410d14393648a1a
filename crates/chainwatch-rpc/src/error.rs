//! Error types for node RPC calls.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur while talking to the node.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("rpc error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl RpcError {
    /// Whether the node answered but the payload could not be interpreted.
    pub fn is_decode(&self) -> bool {
        matches!(self, RpcError::Decode(_))
    }
}
