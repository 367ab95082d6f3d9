//! Request id allocation
//!
//! Every engine owns one [`IdAllocator`]. Ids start at 1, only ever increase,
//! and are tracked as outstanding until the engine releases them.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues request ids and tracks which are in flight
///
/// Safe to share across threads and tasks. An id is never handed out twice,
/// even after it has been released, so a slow or duplicated server response
/// can never be mistaken for a newer call's.
///
/// # Examples
///
/// ```rust
/// use rpcall_core::IdAllocator;
///
/// let ids = IdAllocator::new();
/// let a = ids.allocate();
/// let b = ids.allocate();
/// assert!(b > a);
///
/// assert!(ids.release(a));
/// assert!(!ids.release(a));
/// assert_eq!(ids.outstanding_count(), 1);
/// ```
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
    outstanding: Mutex<BTreeSet<u64>>,
}

impl IdAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            outstanding: Mutex::new(BTreeSet::new()),
        }
    }

    /// Issue a fresh id and record it as outstanding
    pub fn allocate(&self) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.outstanding.lock().insert(id);
        id
    }

    /// Stop tracking an id
    ///
    /// Returns `false` if the id was not outstanding. That is never an error.
    pub fn release(&self, id: u64) -> bool {
        self.outstanding.lock().remove(&id)
    }

    /// Check whether an id is currently outstanding
    pub fn is_outstanding(&self, id: u64) -> bool {
        self.outstanding.lock().contains(&id)
    }

    /// Number of ids currently outstanding
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.lock().len()
    }

    /// The most recently issued id, or `None` before the first allocation
    pub fn last_allocated(&self) -> Option<u64> {
        match self.next.load(Ordering::Relaxed) {
            1 => None,
            next => Some(next - 1),
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_one() {
        let ids = IdAllocator::new();
        assert_eq!(ids.last_allocated(), None);
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.last_allocated(), Some(1));
    }

    #[test]
    fn test_strictly_increasing() {
        let ids = IdAllocator::new();
        let mut previous = 0;
        for _ in 0..100 {
            let id = ids.allocate();
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn test_never_reused_after_release() {
        let ids = IdAllocator::new();
        let first = ids.allocate();
        ids.release(first);
        let second = ids.allocate();
        assert!(second > first);
        assert!(!ids.is_outstanding(first));
        assert!(ids.is_outstanding(second));
    }

    #[test]
    fn test_release_untracked_is_noop() {
        let ids = IdAllocator::new();
        assert!(!ids.release(42));
        let id = ids.allocate();
        assert!(ids.release(id));
        assert!(!ids.release(id));
        assert_eq!(ids.outstanding_count(), 0);
    }

    #[test]
    fn test_concurrent_allocation_unique() {
        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.allocate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "id {} issued twice", id);
            }
        }

        assert_eq!(seen.len(), 2000);
        assert_eq!(ids.outstanding_count(), 2000);
    }
}
