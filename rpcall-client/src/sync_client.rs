//! Blocking call engine
//!
//! One call occupies the calling thread for its whole round trip:
//!
//! 1. Build the request, allocating its id
//! 2. Run the pre-call hooks (a failure aborts before anything is sent)
//! 3. Hand the encoded request to the transport and wait for the reply
//! 4. Release the id
//! 5. Interpret and classify the reply
//!
//! The engine is `Sync`: calls from several threads share one id allocator
//! and never collide.

use crate::context::{CallContext, IdLease};
use crate::hooks::{PreCallHook, PreCallHooks};
use crate::metrics::ClientMetrics;
use crate::transport::Transport;
use rpcall_core::{
    build_request, codec, decode_output, resolve, ErrorClassifier, IdAllocator, Params,
    RawResponse, RemoteMethod, Result,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Synchronous JSON-RPC client over any blocking [`Transport`]
pub struct RpcClient<T> {
    transport: T,
    ctx: CallContext,
}

impl<T: Transport> RpcClient<T> {
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

    /// The underlying transport (e.g. to change HTTP headers)
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
    pub fn call(&self, method: &str, params: Option<Params>) -> Result<Value> {
        let started = Instant::now();
        let outcome = self
            .round_trip(method, params)
            .and_then(|raw| resolve(&raw, &self.ctx.classifier));
        self.ctx.finish(method, started, outcome)
    }

    /// Call `method` with any value serializing to an array or object
    pub fn call_with<P: Serialize + ?Sized>(&self, method: &str, params: &P) -> Result<Value> {
        self.call(method, Some(Params::from_serializable(params)?))
    }

    /// Call a typed remote method
    pub fn invoke<M: RemoteMethod>(&self, method: &M) -> Result<M::Output> {
        let value = self.call(M::NAME, method.params()?)?;
        decode_output::<M>(value)
    }

    fn round_trip(&self, method: &str, params: Option<Params>) -> Result<RawResponse> {
        let request = build_request(&self.ctx.ids, method, params)?;
        let _lease = IdLease::new(&self.ctx.ids, request.id);

        self.ctx.hooks.run_blocking()?;

        let payload = codec::encode_request(&request)?;
        tracing::debug!(id = request.id, "Sending request");
        self.transport.send_and_receive(&payload, request.id)
    }
}
