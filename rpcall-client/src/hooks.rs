//! Pre-call hooks
//!
//! Hooks run, in registration order, after a call's request has been built and
//! before anything is sent. Typical use is refreshing an auth token and
//! writing it into the transport's headers. The first hook that fails aborts
//! the call; its error reaches the caller as `Error::Hook` untouched.
//!
//! # Examples
//!
//! ```rust
//! use rpcall_client::{PreCallHook, PreCallHooks};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let refreshed = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&refreshed);
//!
//! let hooks = PreCallHooks::new();
//! hooks.push(PreCallHook::blocking(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! }));
//!
//! hooks.run_blocking().unwrap();
//! assert_eq!(refreshed.load(Ordering::SeqCst), 1);
//! ```

use futures::future::BoxFuture;
use parking_lot::RwLock;
use rpcall_core::{Error, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What a hook returns: any error type is accepted and preserved
pub type HookResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type BlockingHookFn = dyn Fn() -> HookResult + Send + Sync;
type AsyncHookFn = dyn Fn() -> BoxFuture<'static, HookResult> + Send + Sync;

/// A single zero-argument hook, plain or awaitable
#[derive(Clone)]
pub enum PreCallHook {
    /// Runs to completion on the calling thread
    Blocking(Arc<BlockingHookFn>),
    /// Produces a future that is awaited before the call proceeds
    Async(Arc<AsyncHookFn>),
}

impl PreCallHook {
    /// Wrap a plain closure
    pub fn blocking<F>(hook: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        PreCallHook::Blocking(Arc::new(hook))
    }

    /// Wrap a closure returning a future
    pub fn asynchronous<F, Fut>(hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        PreCallHook::Async(Arc::new(move || Box::pin(hook())))
    }

    async fn run(&self) -> HookResult {
        match self {
            PreCallHook::Blocking(hook) => hook(),
            PreCallHook::Async(hook) => hook().await,
        }
    }

    fn run_blocking(&self) -> HookResult {
        match self {
            PreCallHook::Blocking(hook) => hook(),
            PreCallHook::Async(hook) => futures::executor::block_on(hook()),
        }
    }
}

impl fmt::Debug for PreCallHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreCallHook::Blocking(_) => f.write_str("PreCallHook::Blocking"),
            PreCallHook::Async(_) => f.write_str("PreCallHook::Async"),
        }
    }
}

/// Ordered, shared list of hooks
///
/// Clones share the same list, so hooks added through a client's `hooks()`
/// handle apply to every later call on that client.
#[derive(Clone, Default)]
pub struct PreCallHooks {
    hooks: Arc<RwLock<Vec<PreCallHook>>>,
}

impl PreCallHooks {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook
    pub fn push(&self, hook: PreCallHook) {
        self.hooks.write().push(hook);
    }

    /// Replace every hook
    pub fn set(&self, hooks: Vec<PreCallHook>) {
        *self.hooks.write() = hooks;
    }

    /// Remove every hook
    pub fn clear(&self) {
        self.hooks.write().clear();
    }

    /// Number of hooks
    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    // Hooks may add or remove hooks, so never hold the lock while running one
    fn snapshot(&self) -> Vec<PreCallHook> {
        self.hooks.read().clone()
    }

    /// Await every hook in order, stopping at the first failure
    pub async fn run(&self) -> Result<()> {
        for hook in self.snapshot() {
            hook.run().await.map_err(Error::hook)?;
        }
        Ok(())
    }

    /// Run every hook in order on the current thread
    ///
    /// Async hooks are driven to completion with a local executor.
    pub fn run_blocking(&self) -> Result<()> {
        for hook in self.snapshot() {
            hook.run_blocking().map_err(Error::hook)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PreCallHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hooks.read().iter()).finish()
    }
}

impl From<Vec<PreCallHook>> for PreCallHooks {
    fn from(hooks: Vec<PreCallHook>) -> Self {
        Self {
            hooks: Arc::new(RwLock::new(hooks)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> HookResult + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |name| {
            sink.lock().push(name);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_hooks_run_in_order() {
        let (log, record) = recorder();
        let hooks = PreCallHooks::new();

        let r = record.clone();
        hooks.push(PreCallHook::blocking(move || r("first")));
        let r = record.clone();
        hooks.push(PreCallHook::asynchronous(move || {
            let r = r.clone();
            async move { r("second") }
        }));
        let r = record.clone();
        hooks.push(PreCallHook::blocking(move || r("third")));

        hooks.run().await.unwrap();
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_blocking_runner_drives_async_hooks() {
        let (log, record) = recorder();
        let hooks = PreCallHooks::from(vec![PreCallHook::asynchronous(move || {
            let record = record.clone();
            async move { record("async") }
        })]);

        hooks.run_blocking().unwrap();
        assert_eq!(*log.lock(), vec!["async"]);
    }

    #[tokio::test]
    async fn test_failure_stops_later_hooks() {
        let (log, record) = recorder();
        let hooks = PreCallHooks::new();

        hooks.push(PreCallHook::blocking(|| {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "refresh failed").into())
        }));
        hooks.push(PreCallHook::blocking(move || record("never")));

        match hooks.run().await {
            Err(Error::Hook(inner)) => assert_eq!(inner.to_string(), "refresh failed"),
            other => panic!("Expected Hook error, got {:?}", other),
        }
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_clones_share_list() {
        let hooks = PreCallHooks::new();
        let shared = hooks.clone();

        shared.push(PreCallHook::blocking(|| Ok(())));
        assert_eq!(hooks.len(), 1);

        hooks.set(vec![]);
        assert!(shared.is_empty());

        shared.push(PreCallHook::blocking(|| Ok(())));
        shared.clear();
        assert!(hooks.is_empty());
    }
}
