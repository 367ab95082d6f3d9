//! Outstanding-call registry for the multiplexed client
//!
//! Each in-flight call owns a oneshot channel keyed by its request id. The
//! caller registers before sending; the receive loop completes the entry when
//! the matching response arrives; teardown fails whatever is left.
//!
//! # Call Lifecycle
//!
//! 1. **Register**: caller inserts a sender under its id and keeps the receiver
//! 2. **Send**: the request goes out on the shared socket
//! 3. **Complete**: the receive loop removes the entry and delivers the raw response
//! 4. **Or fail**: on teardown every remaining entry gets the same error
//! 5. **Or abandon**: a caller that times out or is dropped removes its own entry
//!
//! An entry is removed exactly once, by whichever of these happens first.

use parking_lot::Mutex;
use rpcall_core::{Error, RawResponse, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

type Completion = oneshot::Sender<Result<RawResponse>>;

/// Registry of calls waiting for their response
#[derive(Clone, Default)]
pub struct PendingCalls {
    waiters: Arc<Mutex<HashMap<u64, Completion>>>,
}

impl PendingCalls {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completion token for `id`
    pub fn register(&self, id: u64) -> oneshot::Receiver<Result<RawResponse>> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);
        rx
    }

    /// Deliver a response to the waiter for `id`
    ///
    /// Returns `false` if nobody is waiting for that id (the caller gave up,
    /// or the server answered an id we never sent).
    pub fn complete(&self, id: u64, response: RawResponse) -> bool {
        match self.waiters.lock().remove(&id) {
            Some(tx) => tx.send(Ok(response)).is_ok(),
            None => false,
        }
    }

    /// Drop the waiter for `id` without completing it
    pub fn remove(&self, id: u64) -> bool {
        self.waiters.lock().remove(&id).is_some()
    }

    /// Fail every waiter with `error` and empty the registry
    ///
    /// Returns the number of waiters that were failed.
    pub fn fail_all(&self, error: Error) -> usize {
        let drained: Vec<_> = self.waiters.lock().drain().collect();
        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(error.clone()));
        }
        count
    }

    /// Number of calls currently waiting
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Whether no call is waiting
    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }
}
