//! Multiplexed JSON-RPC client over WebSocket
//!
//! One WebSocket connection carries any number of concurrent calls. Each call
//! registers a completion token under its request id and waits on it; a single
//! background task reads every inbound message and hands it to the token with
//! the matching id. Responses can arrive in any order.
//!
//! # Client Lifecycle
//!
//! 1. **Create**: `WsClient::new(url)` or `WsClient::builder(url)`; starts `Disconnected`
//! 2. **Connect**: handshake, then spawn the receive loop; now `Connected`
//! 3. **Call**: any number of tasks call concurrently through clones of the client
//! 4. **Close**: `close()`, a server close frame, or a socket error tears the
//!    connection down and fails every waiting call with `ConnectionClosed`
//!
//! A closed client can be connected again; calls in between fail with
//! `ConnectionNotOpen`.
//!
//! # Cloning
//!
//! `WsClient` is cheaply cloneable. All clones share the connection, the
//! registry of waiting calls and the id allocator.
//!
//! # Inbound messages that match no call
//!
//! Messages that are not valid JSON, carry no positive integer id, or answer
//! an id nobody is waiting for (the caller timed out or went away) are logged
//! and discarded. Nothing is retained for them.

use crate::client_builder::ClientBuilder;
use crate::connection_state::{ConnectionState, StateCell};
use crate::context::{CallContext, IdLease};
use crate::hooks::PreCallHooks;
use crate::request::PendingCalls;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use rpcall_core::{
    build_request, codec, decode_output, resolve, Error, IdAllocator, Params, RawResponse,
    RemoteMethod, Result,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// JSON-RPC client multiplexing calls over one WebSocket
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) url: String,
    /// Read on every handshake, so changes apply from the next connect
    headers: parking_lot::RwLock<Vec<(String, String)>>,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) ctx: CallContext,
    /// `None` while disconnected. Held across register-then-send and across
    /// teardown so the two never interleave.
    writer: Mutex<Option<WsWriter>>,
    pending: PendingCalls,
    state: StateCell,
    /// Bumped on every successful connect; a receive loop only tears down
    /// the connection it was started for
    generation: AtomicU64,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    pub(crate) fn new(
        url: String,
        headers: Vec<(String, String)>,
        request_timeout: Option<Duration>,
        ctx: CallContext,
    ) -> Self {
        Self {
            url,
            headers: parking_lot::RwLock::new(headers),
            request_timeout,
            ctx,
            writer: Mutex::new(None),
            pending: PendingCalls::new(),
            state: StateCell::new(),
            generation: AtomicU64::new(0),
            reader: parking_lot::Mutex::new(None),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.set(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Connection state changed");
        }
        if let Some(metrics) = &self.ctx.metrics {
            metrics.update_connection_state(state);
        }
    }

    fn drop_message(&self, reason: &'static str) {
        if let Some(metrics) = &self.ctx.metrics {
            metrics.record_dropped_message(reason);
        }
    }

    /// Route one inbound message to the call waiting for it
    fn dispatch(&self, raw: RawResponse) {
        let value = match codec::decode_value(&raw) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(payload = %raw.to_diagnostic(), "Dropping malformed message");
                self.drop_message("malformed");
                return;
            }
        };

        let id = codec::response_id(&value);
        let Some(request_id) = id.as_request_id() else {
            tracing::warn!(%id, "Dropping message without a usable response id");
            self.drop_message("unattributable");
            return;
        };

        if self.pending.complete(request_id, RawResponse::Json(value)) {
            tracing::debug!(id = request_id, "Response delivered");
        } else {
            tracing::warn!(id = request_id, "Dropping response nobody is waiting for");
            self.drop_message("unmatched");
        }
    }

    /// Close the writer and fail every waiting call
    ///
    /// With `Some(generation)`, only acts if that connection is still the
    /// current one.
    async fn teardown(&self, generation: Option<u64>) {
        let mut writer = self.writer.lock().await;

        if let Some(generation) = generation {
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
        }

        if let Some(mut sink) = writer.take() {
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "Error closing WebSocket writer");
            }
        }

        self.set_state(ConnectionState::Disconnected);

        let failed = self.pending.fail_all(Error::ConnectionClosed);
        if failed > 0 {
            tracing::info!(failed, "Failed calls still waiting on the closed connection");
        }
    }
}

impl WsClient {
    /// Create a disconnected client for `url` with default settings
    pub fn new(url: impl Into<String>) -> Self {
        ClientBuilder::new(url).build()
    }

    /// Start configuring a client for `url`
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Server URL
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// Whether the connection is open
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Headers sent with the WebSocket handshake
    pub fn headers(&self) -> Vec<(String, String)> {
        self.inner.headers.read().clone()
    }

    /// Replace the handshake headers
    ///
    /// Takes effect on the next `connect`; an open connection keeps the
    /// headers it was opened with. Names and values are validated when
    /// connecting.
    pub fn set_headers<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        *self.inner.headers.write() = headers
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
    }

    /// Add or replace one handshake header, matching names case-insensitively
    ///
    /// Takes effect on the next `connect`.
    pub fn insert_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut headers = self.inner.headers.write();
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        headers.push((name, value.into()));
    }

    /// Number of calls waiting for a response
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// The pre-call hooks; changes apply to later calls
    pub fn hooks(&self) -> &PreCallHooks {
        &self.inner.ctx.hooks
    }

    /// The id allocator
    pub fn ids(&self) -> &IdAllocator {
        &self.inner.ctx.ids
    }

    /// Open the connection and start the receive loop
    ///
    /// Does nothing if already connected.
    #[tracing::instrument(skip(self), fields(url = %self.inner.url))]
    pub async fn connect(&self) -> Result<()> {
        let mut writer = self.inner.writer.lock().await;
        if writer.is_some() {
            return Ok(());
        }

        tracing::info!("Connecting to server");
        self.inner.set_state(ConnectionState::Connecting);

        let stream = match self.handshake().await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(error = %error, "Connection failed");
                self.inner.set_state(ConnectionState::Disconnected);
                return Err(error);
            }
        };

        let (sink, reader) = stream.split();
        *writer = Some(sink);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let handle = tokio::spawn(receive_loop(Arc::clone(&self.inner), reader, generation));
        if let Some(previous) = self.inner.reader.lock().replace(handle) {
            previous.abort();
        }

        self.inner.set_state(ConnectionState::Connected);
        tracing::info!("Connected");
        Ok(())
    }

    async fn handshake(&self) -> Result<WsStream> {
        let mut request = self
            .inner
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        let headers = self.inner.headers.read().clone();
        for (name, value) in &headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidRequest(format!("invalid header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::InvalidRequest(format!("invalid value for header '{}': {}", name, e))
            })?;
            request.headers_mut().insert(header_name, header_value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        Ok(stream)
    }

    /// Close the connection
    ///
    /// Every call still waiting fails with `Error::ConnectionClosed`.
    pub async fn close(&self) {
        tracing::info!(url = %self.inner.url, "Closing connection");
        self.inner.teardown(None).await;

        if let Some(reader) = self.inner.reader.lock().take() {
            reader.abort();
        }
    }

    /// Call `method`, waiting up to the configured default timeout
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call(&self, method: &str, params: Option<Params>) -> Result<Value> {
        self.call_inner(method, params, self.inner.request_timeout).await
    }

    /// Call `method`, waiting at most `timeout` for the response
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Option<Params>,
        timeout: Duration,
    ) -> Result<Value> {
        self.call_inner(method, params, Some(timeout)).await
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

    async fn call_inner(
        &self,
        method: &str,
        params: Option<Params>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let started = Instant::now();
        let outcome = match self.round_trip(method, params, timeout).await {
            Ok(raw) => resolve(&raw, &self.inner.ctx.classifier),
            Err(error) => Err(error),
        };
        self.inner.ctx.finish(method, started, outcome)
    }

    async fn round_trip(
        &self,
        method: &str,
        params: Option<Params>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse> {
        let ctx = &self.inner.ctx;
        let request = build_request(&ctx.ids, method, params)?;
        let id = request.id;
        let _lease = IdLease::new(&ctx.ids, id);

        ctx.hooks.run().await?;

        let payload = codec::encode_request(&request)?;
        let (receiver, _waiting) = self.send(id, payload).await?;

        let delivered = match timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(delivered) => delivered,
                Err(_) => {
                    tracing::debug!(id, timeout_ms = limit.as_millis() as u64, "Call timed out");
                    return Err(Error::Timeout);
                }
            },
            None => receiver.await,
        };

        // A dropped sender means the registry entry went away without an answer
        delivered.map_err(|_| Error::ConnectionClosed)?
    }

    /// Register a token for `id` and send, atomically with respect to teardown
    ///
    /// The returned guard owns the registration from the moment it exists, so
    /// a caller dropped mid-write leaves nothing behind.
    async fn send(
        &self,
        id: u64,
        payload: String,
    ) -> Result<(oneshot::Receiver<Result<RawResponse>>, Waiting<'_>)> {
        let mut writer = self.inner.writer.lock().await;
        let sink = writer.as_mut().ok_or(Error::ConnectionNotOpen)?;

        let receiver = self.inner.pending.register(id);
        let waiting = Waiting {
            pending: &self.inner.pending,
            id,
        };

        sink.send(Message::Text(payload))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        tracing::debug!(id, "Request sent, waiting for response");
        Ok((receiver, waiting))
    }
}

/// Deregisters a call's token if it stops waiting before completion
struct Waiting<'a> {
    pending: &'a PendingCalls,
    id: u64,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.id);
    }
}

/// Single reader for one connection
async fn receive_loop(inner: Arc<Inner>, mut reader: WsReader, generation: u64) {
    while let Some(message) = reader.next().await {
        match message {
            Ok(Message::Text(text)) => inner.dispatch(RawResponse::Text(text)),
            Ok(Message::Binary(bytes)) => inner.dispatch(RawResponse::Bytes(bytes)),
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Connection closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    inner.teardown(Some(generation)).await;
}
