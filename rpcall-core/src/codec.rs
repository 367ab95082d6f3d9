//! Codec for JSON-RPC message serialization and deserialization
//!
//! Outbound requests are encoded here; inbound payloads are only decoded into
//! a generic JSON value. Deciding what a decoded payload *means* is the job of
//! the [`interpret`](crate::interpret) module.
//!
//! # Examples
//!
//! ```rust
//! use rpcall_core::{build_request, codec, IdAllocator};
//!
//! let ids = IdAllocator::new();
//! let request = build_request(&ids, "ping", None).unwrap();
//! let json = codec::encode_request(&request).unwrap();
//! assert_eq!(json, r#"{"jsonrpc":"2.0","method":"ping","id":1}"#);
//! ```

use crate::error::{Error, Result};
use crate::types::{Id, JsonRpcRequest, RawResponse};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable message to a JSON string
///
/// # Errors
///
/// Returns `Error::Serialization` if the message cannot be serialized to JSON.
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a JSON-RPC request to JSON
pub fn encode_request(req: &JsonRpcRequest) -> Result<String> {
    encode(req)
}

/// Decode a raw payload into a JSON value
///
/// Malformed JSON (or non-UTF-8 bytes) becomes `Error::InvalidResponse`
/// carrying the raw payload, so callers never see a bare parse error for
/// something the server sent.
///
/// ```rust
/// use rpcall_core::{codec, Error, RawResponse};
///
/// let value = codec::decode_value(&RawResponse::from(r#"{"id":1,"result":2}"#)).unwrap();
/// assert_eq!(value["result"], 2);
///
/// let err = codec::decode_value(&RawResponse::from("{not json")).unwrap_err();
/// assert!(matches!(err, Error::InvalidResponse { .. }));
/// ```
pub fn decode_value(raw: &RawResponse) -> Result<Value> {
    let decoded = match raw {
        RawResponse::Text(text) => serde_json::from_str(text),
        RawResponse::Bytes(bytes) => serde_json::from_slice(bytes),
        RawResponse::Json(value) => return Ok(value.clone()),
    };

    decoded.map_err(|e| {
        tracing::debug!(error = %e, "Response payload is not valid JSON");
        Error::invalid_response(raw.to_diagnostic())
    })
}

/// Extract the `id` member of a decoded response
///
/// Returns `Id::Null` when the member is missing or is not a string, number,
/// or null.
pub fn response_id(value: &Value) -> Id {
    value
        .get("id")
        .and_then(|id| serde_json::from_value::<Id>(id.clone()).ok())
        .unwrap_or(Id::Null)
}
