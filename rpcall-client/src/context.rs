//! State every call engine carries
//!
//! The three engines differ in how a request reaches the server, not in what
//! happens around it: ids come from one allocator, server errors go through
//! one classifier, the same hooks run first and the same metrics are recorded.

use crate::hooks::PreCallHooks;
use crate::metrics::ClientMetrics;
use rpcall_core::{ErrorClassifier, IdAllocator, Result};
use std::sync::Arc;
use std::time::Instant;

#[derive(Default)]
pub(crate) struct CallContext {
    pub(crate) ids: IdAllocator,
    pub(crate) classifier: ErrorClassifier,
    pub(crate) hooks: PreCallHooks,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

impl CallContext {
    /// Log and record the outcome of a finished call
    pub(crate) fn finish<T>(&self, method: &str, started: Instant, outcome: Result<T>) -> Result<T> {
        let elapsed = started.elapsed();

        match &outcome {
            Ok(_) => tracing::debug!(
                method,
                duration_secs = elapsed.as_secs_f64(),
                "Call completed"
            ),
            Err(error) => tracing::debug!(
                method,
                error = %error,
                kind = error.label(),
                "Call failed"
            ),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_call(method, &outcome, elapsed);
        }

        outcome
    }
}

/// Releases an allocated id when dropped
///
/// Covers every exit from a call: success, early `?` returns, a timeout, or
/// the caller dropping the future mid-flight.
pub(crate) struct IdLease<'a> {
    ids: &'a IdAllocator,
    id: u64,
}

impl<'a> IdLease<'a> {
    pub(crate) fn new(ids: &'a IdAllocator, id: u64) -> Self {
        Self { ids, id }
    }
}

impl Drop for IdLease<'_> {
    fn drop(&mut self) {
        self.ids.release(self.id);
    }
}
