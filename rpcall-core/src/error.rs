//! Error types for rpcall
//!
//! This module defines everything a caller of `call` can receive instead of a
//! result value:
//!
//! - **Error**: The single error enum returned by every rpcall operation
//! - **JsonRpcErrorData**: The `{code, message, data}` object a server sends
//! - **RpcError**: A server error object together with its classified kind
//!
//! # Error Categories
//!
//! - **Protocol violations**: `InvalidResponse` when the server's payload cannot
//!   be decoded or is neither a result nor an error response
//! - **Server-reported errors**: `Rpc`, classified into standard protocol
//!   errors, server-range errors, custom kinds, or generic JSON-RPC errors
//! - **Transport errors**: `Http`, `WebSocket`, `ConnectionNotOpen`,
//!   `ConnectionClosed`, `Timeout`
//! - **Local errors**: `InvalidRequest`, `Serialization`, `Hook`
//!
//! # Examples
//!
//! ```rust
//! use rpcall_core::{Error, ErrorClassifier, JsonRpcErrorData, ErrorKind};
//!
//! let classifier = ErrorClassifier::new();
//! let error = classifier.into_error(JsonRpcErrorData::new(-32601, "Method not found"));
//!
//! assert_eq!(error.kind(), Some(&ErrorKind::MethodNotFound));
//! assert_eq!(error.code(), Some(-32601));
//! ```

use crate::classify::ErrorKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for rpcall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a pre-call hook, kept exactly as the hook produced it
pub type HookError = Arc<dyn std::error::Error + Send + Sync>;

/// Error type for rpcall operations
///
/// `Error` is `Clone` so a single teardown error can be delivered to every
/// call that is still waiting on a closed connection.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The server's payload was malformed JSON or matched neither response shape
    ///
    /// `payload` carries the offending data for diagnostics: the decoded object
    /// when it parsed but had no `result`/`error`, otherwise the raw text.
    #[error("Invalid response from server: {payload}")]
    InvalidResponse {
        /// The payload that could not be interpreted
        payload: serde_json::Value,
    },

    /// The server answered with a JSON-RPC error object
    #[error("JSON-RPC error: {0}")]
    Rpc(RpcError),

    /// Serialization or deserialization of caller-side data failed
    ///
    /// Raised when params cannot be turned into JSON, or when a result does
    /// not fit the type a typed call asked for.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The request could not be built (empty method name, scalar params)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP transport failure (connection refused, body read error, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A call was attempted on a connection that is not open
    #[error("Connection not open")]
    ConnectionNotOpen,

    /// The connection closed while the call was waiting for its response
    #[error("Connection closed")]
    ConnectionClosed,

    /// No response arrived within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// A pre-call hook failed; the call was never sent
    #[error("Pre-call hook failed: {0}")]
    Hook(HookError),
}

impl Error {
    /// Build an `InvalidResponse` from any payload
    pub fn invalid_response(payload: impl Into<serde_json::Value>) -> Self {
        Error::InvalidResponse {
            payload: payload.into(),
        }
    }

    /// Wrap a hook's own error without altering it
    pub fn hook(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        let boxed: Box<dyn std::error::Error + Send + Sync> = error.into();
        Error::Hook(Arc::from(boxed))
    }

    /// The classified kind, if this is a server-reported error
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Error::Rpc(rpc) => Some(&rpc.kind),
            _ => None,
        }
    }

    /// The server-supplied error code, if this is a server-reported error
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::Rpc(rpc) => Some(rpc.error.code),
            _ => None,
        }
    }

    /// Short label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Error::InvalidResponse { .. } => "invalid_response",
            Error::Rpc(rpc) => rpc.kind.label(),
            Error::Serialization(_) => "serialization",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Http(_) => "http",
            Error::WebSocket(_) => "websocket",
            Error::ConnectionNotOpen => "connection_not_open",
            Error::ConnectionClosed => "connection_closed",
            Error::Timeout => "timeout",
            Error::Hook(_) => "hook",
        }
    }
}

/// JSON-RPC 2.0 error object as sent by the server
///
/// `code` and `message` are required; `data` is optional and may hold any
/// JSON value. A `data: null` member deserializes as absent.
///
/// # Examples
///
/// ```rust
/// use rpcall_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error = JsonRpcErrorData::with_data(
///     -32000,
///     "Insufficient funds",
///     json!({"balance": 50, "required": 100})
/// );
/// assert_eq!(error.to_string(), "[-32000] Insufficient funds");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code, signed
    pub code: i64,

    /// Short description supplied by the server
    pub message: String,

    /// Optional additional error information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error object carrying additional data
    pub fn with_data(code: i64, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}

/// A server error object wrapped in the kind the classifier selected
///
/// The classifier never invents a message; `error` is exactly what the
/// server sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    /// Which error kind the code maps to
    pub kind: ErrorKind,
    /// The server-supplied error object
    pub error: JsonRpcErrorData,
}

impl RpcError {
    /// Server-supplied message
    pub fn message(&self) -> &str {
        &self.error.message
    }

    /// Server-supplied data, if any
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.error.data.as_ref()
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.error)
    }
}
