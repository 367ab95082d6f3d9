//! Async point-to-point call engine
//!
//! The same round trip as [`RpcClient`](crate::RpcClient), awaiting hooks and
//! transport instead of blocking. Each call has its own request and response,
//! so any number of calls can be in flight at once without extra bookkeeping.

use crate::context::{CallContext, IdLease};
use crate::hooks::{PreCallHook, PreCallHooks};
use crate::metrics::ClientMetrics;
use crate::transport::AsyncTransport;
use rpcall_core::{
    build_request, codec, decode_output, resolve, ErrorClassifier, IdAllocator, Params,
    RawResponse, RemoteMethod, Result,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Async JSON-RPC client over any [`AsyncTransport`]
///
/// ```rust,no_run
/// use rpcall_client::{AsyncHttpTransport, AsyncRpcClient};
/// use serde_json::json;
///
/// # async fn example() -> rpcall_core::Result<()> {
/// let client = AsyncRpcClient::new(AsyncHttpTransport::new("http://localhost:8080/rpc")?);
/// let sum = client.call_with("add", &json!([2, 3])).await?;
/// assert_eq!(sum, 5);
/// # Ok(())
/// # }
/// ```
pub struct AsyncRpcClient<T> {
    transport: T,
    ctx: CallContext,
}

impl<T: AsyncTransport> AsyncRpcClient<T> {
    /// Create a client on `transport`
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            ctx: CallContext::default(),
        }
    }

    /// Map one server-range error code to a custom error kind
    pub fn with_server_error(mut self, code: i64, name: impl Into<String>) -> Self {
        self.ctx.classifier.register_server_error(code, name);
        self
    }

    /// Replace the error classifier
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.ctx.classifier = classifier;
        self
    }

    /// Append a pre-call hook
    pub fn with_hook(self, hook: PreCallHook) -> Self {
        self.ctx.hooks.push(hook);
        self
    }

    /// Use a (possibly shared) hook list
    pub fn with_hooks(mut self, hooks: PreCallHooks) -> Self {
        self.ctx.hooks = hooks;
        self
    }

    /// Record call metrics
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.ctx.metrics = Some(metrics);
        self
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The pre-call hooks; changes apply to later calls
    pub fn hooks(&self) -> &PreCallHooks {
        &self.ctx.hooks
    }

    /// The id allocator
    pub fn ids(&self) -> &IdAllocator {
        &self.ctx.ids
    }

    /// Call `method` and return its raw result value
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call(&self, method: &str, params: Option<Params>) -> Result<Value> {
        let started = Instant::now();
        let outcome = match self.round_trip(method, params).await {
            Ok(raw) => resolve(&raw, &self.ctx.classifier),
            Err(error) => Err(error),
        };
        self.ctx.finish(method, started, outcome)
    }

    /// Call `method` with any value serializing to an array or object
    pub async fn call_with<P: Serialize + ?Sized>(&self, method: &str, params: &P) -> Result<Value> {
        let params = Params::from_serializable(params)?;
        self.call(method, Some(params)).await
    }

    /// Call a typed remote method
    pub async fn invoke<M: RemoteMethod>(&self, method: &M) -> Result<M::Output> {
        let value = self.call(M::NAME, method.params()?).await?;
        decode_output::<M>(value)
    }

    async fn round_trip(&self, method: &str, params: Option<Params>) -> Result<RawResponse> {
        let request = build_request(&self.ctx.ids, method, params)?;
        let _lease = IdLease::new(&self.ctx.ids, request.id);

        self.ctx.hooks.run().await?;

        let payload = codec::encode_request(&request)?;
        tracing::debug!(id = request.id, "Sending request");
        self.transport.send_and_receive(&payload, request.id).await
    }
}
