//! Mapping from JSON-RPC error codes to error kinds
//!
//! Lookup order for a code:
//!
//! 1. Exact match against the fixed standard codes (-32700, -32600..-32603)
//! 2. Inside the server-reserved range (-32099..=-32000): a caller-registered
//!    custom kind for that exact code, or the generic `ServerError`
//! 3. Anything else: a generic `JsonRpc` error
//!
//! The classifier only picks a kind; the server's `{code, message, data}` is
//! carried through untouched.

use crate::error::{Error, JsonRpcErrorData, RpcError};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Invalid JSON was received by the server
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist or is not available
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i64 = -32603;
/// Codes reserved for implementation-defined server errors
pub const SERVER_ERROR_RANGE: RangeInclusive<i64> = -32099..=-32000;

/// The kind of error a server-reported code maps to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// -32700
    ParseError,
    /// -32600
    InvalidRequest,
    /// -32601
    MethodNotFound,
    /// -32602
    InvalidParams,
    /// -32603
    InternalError,
    /// Server-reserved range without a custom registration
    ServerError,
    /// Server-reserved code registered by the caller under this name
    Custom(String),
    /// Any code outside the standard table and the server range
    JsonRpc,
}

impl ErrorKind {
    /// Whether this is one of the five fixed protocol errors
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::ParseError
                | ErrorKind::InvalidRequest
                | ErrorKind::MethodNotFound
                | ErrorKind::InvalidParams
                | ErrorKind::InternalError
        )
    }

    /// Whether the code fell in the server-reserved range
    pub fn is_server_error(&self) -> bool {
        matches!(self, ErrorKind::ServerError | ErrorKind::Custom(_))
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "parse_error",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::MethodNotFound => "method_not_found",
            ErrorKind::InvalidParams => "invalid_params",
            ErrorKind::InternalError => "internal_error",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Custom(_) => "custom_server_error",
            ErrorKind::JsonRpc => "json_rpc_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ParseError => write!(f, "Parse error"),
            ErrorKind::InvalidRequest => write!(f, "Invalid request"),
            ErrorKind::MethodNotFound => write!(f, "Method not found"),
            ErrorKind::InvalidParams => write!(f, "Invalid params"),
            ErrorKind::InternalError => write!(f, "Internal error"),
            ErrorKind::ServerError => write!(f, "Server error"),
            ErrorKind::Custom(name) => write!(f, "{}", name),
            ErrorKind::JsonRpc => write!(f, "JSON-RPC error"),
        }
    }
}

/// Classifies error codes, with optional custom kinds for server-range codes
///
/// # Examples
///
/// ```rust
/// use rpcall_core::{ErrorClassifier, ErrorKind};
///
/// let classifier = ErrorClassifier::new()
///     .with_server_error(-32001, "InsufficientFunds");
///
/// assert_eq!(classifier.classify(-32601), ErrorKind::MethodNotFound);
/// assert_eq!(classifier.classify(-32001), ErrorKind::Custom("InsufficientFunds".into()));
/// assert_eq!(classifier.classify(-32050), ErrorKind::ServerError);
/// assert_eq!(classifier.classify(42), ErrorKind::JsonRpc);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    server_errors: HashMap<i64, String>,
}

impl ErrorClassifier {
    /// Classifier with only the standard table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom kind for one server-range code
    ///
    /// Codes outside `SERVER_ERROR_RANGE` are never looked up in the override
    /// table, so registering one has no effect.
    pub fn with_server_error(mut self, code: i64, name: impl Into<String>) -> Self {
        self.register_server_error(code, name);
        self
    }

    /// In-place form of [`with_server_error`](Self::with_server_error)
    pub fn register_server_error(&mut self, code: i64, name: impl Into<String>) {
        if !SERVER_ERROR_RANGE.contains(&code) {
            tracing::warn!(code, "Custom server error code outside the reserved range is ignored");
        }
        self.server_errors.insert(code, name.into());
    }

    /// Pick the error kind for a code
    pub fn classify(&self, code: i64) -> ErrorKind {
        match code {
            PARSE_ERROR => ErrorKind::ParseError,
            INVALID_REQUEST => ErrorKind::InvalidRequest,
            METHOD_NOT_FOUND => ErrorKind::MethodNotFound,
            INVALID_PARAMS => ErrorKind::InvalidParams,
            INTERNAL_ERROR => ErrorKind::InternalError,
            c if SERVER_ERROR_RANGE.contains(&c) => match self.server_errors.get(&c) {
                Some(name) => ErrorKind::Custom(name.clone()),
                None => ErrorKind::ServerError,
            },
            _ => ErrorKind::JsonRpc,
        }
    }

    /// Wrap a server error object in its classified `Error`
    pub fn into_error(&self, error: JsonRpcErrorData) -> Error {
        let kind = self.classify(error.code);
        Error::Rpc(RpcError { kind, error })
    }
}
