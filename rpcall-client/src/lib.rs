//! JSON-RPC 2.0 client over pluggable transports
//!
//! Three call engines share one request/response pipeline from `rpcall-core`:
//!
//! - **[`RpcClient`]**: blocking, one call per thread, over any [`Transport`]
//! - **[`AsyncRpcClient`]**: async, over any [`AsyncTransport`]
//! - **[`WsClient`]**: async, many concurrent calls multiplexed over one WebSocket
//!
//! HTTP transports for the first two are included ([`HttpTransport`],
//! [`AsyncHttpTransport`]). Every engine runs the same [`PreCallHooks`] before
//! sending, classifies server errors the same way, and can record
//! [`ClientMetrics`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rpcall_client::WsClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WsClient::new("ws://localhost:8080");
//!     client.connect().await?;
//!
//!     // Both calls share the connection; each gets its own answer
//!     let slow = json!([1.0]);
//!     let fast = json!([0.8]);
//!     let (a, b) = tokio::join!(
//!         client.call_with("wait", &slow),
//!         client.call_with("wait", &fast),
//!     );
//!     println!("{} {}", a?, b?);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Blocking HTTP
//!
//! ```rust,no_run
//! use rpcall_client::{HttpTransport, RpcClient};
//!
//! # fn example() -> rpcall_core::Result<()> {
//! let client = RpcClient::new(HttpTransport::new("http://localhost:8080/rpc")?)
//!     .with_server_error(-32001, "InsufficientFunds");
//!
//! let balance = client.call_with("balance", &["alice"])?;
//! # Ok(())
//! # }
//! ```

mod async_client;
mod client;
mod client_builder;
mod connection_state;
mod context;
mod hooks;
mod http;
mod metrics;
mod request;
mod sync_client;
mod transport;

pub use async_client::AsyncRpcClient;
pub use client::WsClient;
pub use client_builder::ClientBuilder;
pub use connection_state::ConnectionState;
pub use hooks::{HookResult, PreCallHook, PreCallHooks};
pub use http::{AsyncHttpTransport, HttpTransport};
pub use metrics::ClientMetrics;
pub use request::PendingCalls;
pub use sync_client::RpcClient;
pub use transport::{AsyncTransport, Transport};
