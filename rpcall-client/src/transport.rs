//! Point-to-point transport contracts
//!
//! A transport takes one serialized request and returns the one raw response
//! that answers it. It knows nothing about JSON-RPC beyond that: building the
//! request and interpreting the response stay with the call engine.
//!
//! Multiplexed transports, where one connection carries many calls at once,
//! don't fit this shape; see [`WsClient`](crate::WsClient).

use async_trait::async_trait;
use rpcall_core::{RawResponse, Result};

/// Blocking send-and-receive
///
/// Any `Fn(&str, u64) -> Result<RawResponse>` closure is a transport. Spell
/// out the argument and return types so the closure fits the bound:
///
/// ```rust
/// use rpcall_client::RpcClient;
/// use rpcall_core::{RawResponse, Result};
///
/// let client = RpcClient::new(|_request: &str, id: u64| -> Result<RawResponse> {
///     Ok(RawResponse::from(format!(r#"{{"jsonrpc":"2.0","id":{},"result":"pong"}}"#, id)))
/// });
///
/// assert_eq!(client.call("ping", None).unwrap(), "pong");
/// ```
pub trait Transport: Send + Sync {
    /// Deliver `request` (already-encoded JSON for call `id`) and return the reply
    fn send_and_receive(&self, request: &str, id: u64) -> Result<RawResponse>;
}

impl<F> Transport for F
where
    F: Fn(&str, u64) -> Result<RawResponse> + Send + Sync,
{
    fn send_and_receive(&self, request: &str, id: u64) -> Result<RawResponse> {
        self(request, id)
    }
}

/// Awaitable send-and-receive
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Deliver `request` (already-encoded JSON for call `id`) and return the reply
    async fn send_and_receive(&self, request: &str, id: u64) -> Result<RawResponse>;
}
