//! WebSocket connection state
//!
//! ```text
//! Disconnected → Connecting → Connected
//!       ↑             │           │
//!       └─────────────┴───────────┘
//!     (handshake failed / close / socket error)
//! ```
//!
//! There is no automatic reconnection. Once a connection is lost, every call
//! still waiting fails with `ConnectionClosed` and the client stays
//! `Disconnected` until `connect` is called again.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected (initial state, and after close)
    Disconnected,
    /// WebSocket handshake in progress
    Connecting,
    /// Connected, receive loop running
    Connected,
}

impl ConnectionState {
    /// Numeric form for the connection-state gauge
    pub(crate) fn as_gauge(self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Shared, cloneable holder for the current state
#[derive(Debug, Clone)]
pub(crate) struct StateCell {
    state: Arc<RwLock<ConnectionState>>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Set the state, returning the previous one
    pub(crate) fn set(&self, new_state: ConnectionState) -> ConnectionState {
        std::mem::replace(&mut *self.state.write(), new_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), ConnectionState::Disconnected);

        assert_eq!(cell.set(ConnectionState::Connecting), ConnectionState::Disconnected);
        assert_eq!(cell.set(ConnectionState::Connected), ConnectionState::Connecting);
        assert_eq!(cell.get(), ConnectionState::Connected);

        let shared = cell.clone();
        shared.set(ConnectionState::Disconnected);
        assert_eq!(cell.get(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_display_and_gauge() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Disconnected.as_gauge(), 0);
        assert_eq!(ConnectionState::Connected.as_gauge(), 2);
    }
}
