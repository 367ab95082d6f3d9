//! JSON-RPC 2.0 wire types for the client side
//!
//! - **JsonRpcRequest**: What a call puts on the wire. Always carries a
//!   positive integer id; `params` is omitted entirely when absent.
//! - **Params**: Positional (array) or named (object) parameters
//! - **RawResponse**: What a transport hands back before interpretation
//! - **JsonRpcResponse**: An interpreted response, either a result or an error
//!
//! # Request IDs
//!
//! Requests are always numbered by an [`IdAllocator`](crate::IdAllocator).
//! Responses may carry any id a server chooses, so the response side uses the
//! general [`Id`] type and only positive numbers can be matched to a call.

use crate::error::{Error, JsonRpcErrorData, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON-RPC 2.0 response id
///
/// Serialized untagged, so it reads and writes as the bare JSON value.
///
/// ```rust
/// use rpcall_core::Id;
///
/// let id: Id = serde_json::from_str("7").unwrap();
/// assert_eq!(id.as_request_id(), Some(7));
///
/// let id: Id = serde_json::from_str("\"abc\"").unwrap();
/// assert_eq!(id.as_request_id(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier
    Number(i64),
    /// String identifier
    String(String),
    /// Null identifier (servers use it when the request id was unreadable)
    Null,
}

impl Id {
    /// The id as an allocator id, if it is a positive integer
    pub fn as_request_id(&self) -> Option<u64> {
        match self {
            Id::Number(n) if *n > 0 => Some(*n as u64),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n as i64)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

/// Request parameters: by position or by name
///
/// Named parameters keep their insertion order on the wire.
///
/// ```rust
/// use rpcall_core::Params;
/// use serde_json::json;
///
/// let positional = Params::from(vec![json!(1.0)]);
/// assert_eq!(serde_json::to_string(&positional).unwrap(), "[1.0]");
///
/// let named = Params::from_serializable(&json!({"b": 2, "a": 1})).unwrap();
/// assert_eq!(serde_json::to_string(&named).unwrap(), r#"{"b":2,"a":1}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Ordered sequence of values
    Positional(Vec<Value>),
    /// Mapping of parameter name to value
    Named(Map<String, Value>),
}

impl Params {
    /// Convert any serializable value into params
    ///
    /// The value must serialize to a JSON array or object. Scalars and null
    /// are rejected because JSON-RPC params are always structured.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::try_from(value)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    /// Whether there are no parameters (an empty array or object)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<Value> for Params {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(values) => Ok(Params::Positional(values)),
            Value::Object(map) => Ok(Params::Named(map)),
            other => Err(Error::InvalidRequest(format!(
                "params must be an array or an object, got {}",
                other
            ))),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// JSON-RPC 2.0 request message
///
/// Immutable once built; construct it through
/// [`build_request`](crate::build_request) so the id comes from an allocator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Name of the remote method
    pub method: String,
    /// Omitted from the JSON when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Allocator-issued id
    pub id: u64,
}

impl JsonRpcRequest {
    pub(crate) fn new(method: String, params: Option<Params>, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method,
            params,
            id,
        }
    }
}

/// A response payload as a transport delivered it
///
/// HTTP bodies arrive as bytes, WebSocket text frames as strings, and the
/// multiplexed engine passes along the value it already decoded to route it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// UTF-8 text
    Text(String),
    /// Raw bytes (expected to be UTF-8 JSON)
    Bytes(Vec<u8>),
    /// Already-decoded JSON
    Json(Value),
}

impl RawResponse {
    /// The payload as a JSON value for diagnostics, without decoding it
    ///
    /// Text and bytes become a JSON string (bytes decoded lossily).
    pub fn to_diagnostic(&self) -> Value {
        match self {
            RawResponse::Text(text) => Value::String(text.clone()),
            RawResponse::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            RawResponse::Json(value) => value.clone(),
        }
    }
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        RawResponse::Text(text)
    }
}

impl From<&str> for RawResponse {
    fn from(text: &str) -> Self {
        RawResponse::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RawResponse {
    fn from(bytes: Vec<u8>) -> Self {
        RawResponse::Bytes(bytes)
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        RawResponse::Json(value)
    }
}

/// The two shapes a well-formed response can take
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// `result` member, any JSON value including null
    Result(Value),
    /// `error` member
    Error(JsonRpcErrorData),
}

/// An interpreted JSON-RPC 2.0 response
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    /// Id echoed by the server, `Id::Null` when absent
    pub id: Id,
    /// Result or error
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    /// Check if the response carries a result
    pub fn is_success(&self) -> bool {
        matches!(self.payload, ResponsePayload::Result(_))
    }

    /// Check if the response carries an error
    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }
}
