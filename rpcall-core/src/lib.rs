//! Core JSON-RPC 2.0 client machinery for rpcall
//!
//! Everything here is transport-agnostic and synchronous:
//!
//! - **Ids**: [`IdAllocator`] issues request ids and tracks which are in flight
//! - **Requests**: [`build_request`] and the [`codec`] turn a method call into wire JSON
//! - **Responses**: [`interpret`] decides whether a payload is a result, an
//!   error, or garbage; [`resolve`] reduces it to the call's outcome
//! - **Errors**: [`ErrorClassifier`] maps server error codes to [`ErrorKind`]s
//! - **Typed methods**: [`RemoteMethod`] describes one method's params and result
//! - **Observability**: OpenTelemetry and `tracing` bootstrap
//!
//! The `rpcall-client` crate puts transports and call engines on top.
//!
//! # Example
//!
//! ```rust
//! use rpcall_core::{build_request, codec, resolve, ErrorClassifier, IdAllocator, RawResponse};
//! use serde_json::json;
//!
//! let ids = IdAllocator::new();
//! let request = build_request(&ids, "add", Some(vec![json!(2), json!(3)].into())).unwrap();
//! let wire = codec::encode_request(&request).unwrap();
//! assert!(wire.contains("\"params\":[2,3]"));
//!
//! // ... the transport sends `wire` and hands back the body ...
//! let raw = RawResponse::from(r#"{"jsonrpc":"2.0","id":1,"result":5}"#);
//! ids.release(request.id);
//!
//! assert_eq!(resolve(&raw, &ErrorClassifier::new()).unwrap(), json!(5));
//! ```

pub mod classify;
pub mod codec;
pub mod error;
pub mod id;
pub mod interpret;
pub mod methods;
pub mod observability;
pub mod request;
pub mod types;

pub use classify::{ErrorClassifier, ErrorKind};
pub use error::{Error, HookError, JsonRpcErrorData, Result, RpcError};
pub use id::IdAllocator;
pub use interpret::{interpret, resolve};
pub use methods::{decode_output, RemoteMethod};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use request::build_request;
pub use types::{Id, JsonRpcRequest, JsonRpcResponse, Params, RawResponse, ResponsePayload};

// Referenced by `#[derive(RemoteMethod)]` expansions
#[doc(hidden)]
pub use serde_json;
