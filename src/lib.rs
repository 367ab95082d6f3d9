//! rpcall - JSON-RPC 2.0 client calls over HTTP and WebSocket
//!
//! This is the convenience crate that re-exports all rpcall sub-crates.
//!
//! # Architecture
//!
//! - **rpcall-core**: Request building, response interpretation, error
//!   classification, id allocation, observability
//! - **rpcall-client**: Blocking and async call engines, HTTP transports and
//!   the multiplexed WebSocket client
//! - **rpcall-macros**: `#[derive(RemoteMethod)]` for typed calls
//!
//! # Quick Start - WebSocket
//!
//! ```rust,no_run
//! use rpcall::prelude::*;
//!
//! #[derive(RemoteMethod)]
//! #[rpc(crate = "rpcall", result = f64)]
//! struct Wait {
//!     seconds: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WsClient::builder("ws://localhost:8080")
//!         .with_server_error(-32001, "InsufficientFunds")
//!         .connect()
//!         .await?;
//!
//!     let (a, b) = tokio::join!(
//!         client.invoke(&Wait { seconds: 1.0 }),
//!         client.invoke(&Wait { seconds: 0.8 }),
//!     );
//!     println!("waited {} and {}", a?, b?);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - HTTP
//!
//! ```rust,no_run
//! use rpcall::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::new(HttpTransport::new("http://localhost:8545")?);
//!     let block = client.call("eth_blockNumber", None)?;
//!     println!("{}", block);
//!     Ok(())
//! }
//! ```

pub use rpcall_client::*;
pub use rpcall_core::*;
pub use rpcall_macros::RemoteMethod;

/// Common imports
pub mod prelude {
    pub use rpcall_client::{
        AsyncHttpTransport, AsyncRpcClient, ClientBuilder, HttpTransport, PreCallHook, RpcClient,
        WsClient,
    };
    pub use rpcall_core::{Error, ErrorKind, Params, RemoteMethod};
    pub use rpcall_macros::RemoteMethod;
}
