//! Response interpretation
//!
//! Turns whatever a transport delivered into a result value or a typed error.
//! The rules, applied in order:
//!
//! 1. The payload must decode as JSON
//! 2. A *truthy* `error` member wins: it must be a valid `{code, message, data?}`
//!    object
//! 3. Otherwise the presence of a `result` key (whatever its value, including
//!    `null`, `false` or `0`) makes it a result
//! 4. Anything else is a protocol violation carrying the decoded payload
//!
//! Failures in steps 1 and 2 (malformed JSON, a non-object payload, a broken
//! error object) carry the original raw payload instead. Nothing here panics
//! on input from the wire.

use crate::classify::ErrorClassifier;
use crate::codec;
use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{JsonRpcResponse, RawResponse, ResponsePayload};
use serde_json::Value;

/// Interpret a raw payload as a JSON-RPC response
///
/// # Examples
///
/// ```rust
/// use rpcall_core::{interpret, RawResponse, ResponsePayload};
/// use serde_json::json;
///
/// let response = interpret(&RawResponse::from(r#"{"id":7,"result":42}"#)).unwrap();
/// assert_eq!(response.payload, ResponsePayload::Result(json!(42)));
///
/// assert!(interpret(&RawResponse::from(r#"{"id":7}"#)).is_err());
/// ```
pub fn interpret(raw: &RawResponse) -> Result<JsonRpcResponse> {
    let value = codec::decode_value(raw)?;
    let id = codec::response_id(&value);

    let object = match value.as_object() {
        Some(object) => object,
        None => return Err(Error::invalid_response(raw.to_diagnostic())),
    };

    if let Some(error) = object.get("error").filter(|error| is_truthy(error)) {
        let error: JsonRpcErrorData = serde_json::from_value(error.clone()).map_err(|e| {
            tracing::debug!(error = %e, "Malformed error object in response");
            Error::invalid_response(raw.to_diagnostic())
        })?;

        return Ok(JsonRpcResponse {
            id,
            payload: ResponsePayload::Error(error),
        });
    }

    if let Some(result) = object.get("result") {
        return Ok(JsonRpcResponse {
            id,
            payload: ResponsePayload::Result(result.clone()),
        });
    }

    Err(Error::invalid_response(value))
}

/// Interpret a raw payload and reduce it to the call's outcome
///
/// A result response yields its value; an error response is classified into
/// `Error::Rpc`.
pub fn resolve(raw: &RawResponse, classifier: &ErrorClassifier) -> Result<Value> {
    match interpret(raw)?.payload {
        ResponsePayload::Result(value) => Ok(value),
        ResponsePayload::Error(error) => Err(classifier.into_error(error)),
    }
}

/// JSON truthiness: null, false, zero, and empty strings, arrays, and objects
/// are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
