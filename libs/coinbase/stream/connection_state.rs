//! Lock-free connection state and counters

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Connection lifecycle states
///
/// `Disconnected -> Connecting -> Open -> (Closing | Errored) ->
/// Reconnecting -> Connecting -> ...` with `ShuttingDown` cutting in from
/// any state on graceful exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
    Errored = 4,
    Reconnecting = 5,
    ShuttingDown = 6,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closing,
            4 => ConnectionState::Errored,
            5 => ConnectionState::Reconnecting,
            6 => ConnectionState::ShuttingDown,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Atomic holder for the connection state
pub struct AtomicConnectionState {
    state: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            state: AtomicU8::new(initial as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Open
    }

    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.get() == ConnectionState::ShuttingDown
    }
}

/// Atomic frame counters
pub struct AtomicMetrics {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    reconnect_count: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self {
            frames_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            reconnect_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }
}

impl Default for AtomicMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_the_atomic() {
        let state = AtomicConnectionState::new(ConnectionState::Disconnected);
        assert_eq!(state.get(), ConnectionState::Disconnected);
        assert!(!state.is_connected());

        state.set(ConnectionState::Open);
        assert!(state.is_connected());

        state.set(ConnectionState::ShuttingDown);
        assert!(state.is_shutting_down());
        assert!(!state.is_connected());
    }

    #[test]
    fn counters_accumulate() {
        let metrics = AtomicMetrics::new();
        metrics.increment_sent();
        metrics.increment_sent();
        metrics.increment_received();
        metrics.increment_reconnects();

        assert_eq!(metrics.frames_sent(), 2);
        assert_eq!(metrics.frames_received(), 1);
        assert_eq!(metrics.reconnect_count(), 1);
    }
}
