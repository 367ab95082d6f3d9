//! Client builder for the WebSocket client
//!
//! The `ClientBuilder` provides a fluent API for configuring a [`WsClient`]
//! before connecting. It allows you to:
//! - Add headers to the WebSocket handshake
//! - Set a default per-call timeout
//! - Map server-range error codes to custom error kinds
//! - Register pre-call hooks
//! - Configure observability (OpenTelemetry) and call metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use rpcall_client::{ClientBuilder, PreCallHook};
//! use std::time::Duration;
//!
//! # async fn example() -> rpcall_core::Result<()> {
//! let client = ClientBuilder::new("ws://localhost:8080")
//!     .header("Authorization", "Bearer abc")
//!     .request_timeout(Duration::from_secs(10))
//!     .with_server_error(-32001, "InsufficientFunds")
//!     .with_hook(PreCallHook::blocking(|| Ok(())))
//!     .service_name("wallet-client")
//!     .with_default_observability()
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::{Inner, WsClient};
use crate::context::CallContext;
use crate::hooks::{PreCallHook, PreCallHooks};
use crate::metrics::ClientMetrics;
use rpcall_core::{ErrorClassifier, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating a [`WsClient`]
pub struct ClientBuilder {
    url: String,
    headers: Vec<(String, String)>,
    request_timeout: Option<Duration>,
    classifier: ErrorClassifier,
    hooks: PreCallHooks,
    observability_config: Option<ObservabilityConfig>,
    enable_metrics: bool,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            request_timeout: None,
            classifier: ErrorClassifier::new(),
            hooks: PreCallHooks::new(),
            observability_config: None,
            enable_metrics: false,
            service_name: None,
        }
    }

    /// Add a header to the WebSocket handshake
    ///
    /// Names and values are validated when connecting.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Default time to wait for each response (no limit unless set)
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Map one server-range error code to a custom error kind
    pub fn with_server_error(mut self, code: i64, name: impl Into<String>) -> Self {
        self.classifier.register_server_error(code, name);
        self
    }

    /// Replace the error classifier
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Append a pre-call hook
    pub fn with_hook(self, hook: PreCallHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Use a (possibly shared) hook list
    pub fn with_hooks(mut self, hooks: PreCallHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Initialize OpenTelemetry with a custom configuration and record metrics
    ///
    /// The OTLP exporters need a Tokio runtime, so build the client from
    /// inside one when exports are enabled.
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.enable_metrics = true;
        self
    }

    /// Initialize OpenTelemetry with the default configuration and record metrics
    pub fn with_default_observability(self) -> Self {
        self.with_observability(ObservabilityConfig::default())
    }

    /// Record metrics on the already-installed global meter provider
    pub fn with_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Set service name for observability and metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build a disconnected client
    ///
    /// If observability was requested it is initialized here. An
    /// initialization failure (typically: the application already installed
    /// its own subscriber) is logged and the client is built anyway.
    pub fn build(self) -> WsClient {
        let mut service_name = self.service_name;

        if let Some(mut config) = self.observability_config {
            if let Some(name) = &service_name {
                config.service_name = name.clone();
            }
            if let Err(e) = rpcall_core::init_observability(config.clone()) {
                tracing::warn!(error = %e, "Observability not initialized");
            }
            service_name.get_or_insert(config.service_name);
        }

        let metrics = self.enable_metrics.then(|| {
            Arc::new(ClientMetrics::new(
                service_name.unwrap_or_else(|| "rpcall".to_string()),
            ))
        });

        let ctx = CallContext {
            classifier: self.classifier,
            hooks: self.hooks,
            metrics,
            ..Default::default()
        };

        WsClient::from_inner(Inner::new(self.url, self.headers, self.request_timeout, ctx))
    }

    /// Build the client and connect it
    pub async fn connect(self) -> Result<WsClient> {
        let client = self.build();
        client.connect().await?;
        Ok(client)
    }
}
