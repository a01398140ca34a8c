//! # Backpressure policies for subscriber delivery queues.
//!
//! [`BackpressurePolicy`] decides what the dispatcher does when a subscriber's
//! bounded delivery queue is full at the moment an event is broadcast.
//!
//! - [`BackpressurePolicy::Block`] the dispatcher waits for room (default).
//! - [`BackpressurePolicy::DropNewest`] the event is dropped for that subscriber only.
//!
//! ## Choosing the right policy
//!
//! **Lossless delivery** (every subscriber sees every event):
//! ```text
//! BackpressurePolicy::Block      → slow subscriber stalls the dispatcher
//!                                  until it drains or is cancelled
//! ```
//!
//! **Latency-first delivery** (producer never waits on a slow subscriber):
//! ```text
//! BackpressurePolicy::DropNewest → full queue loses the event for that
//!                                  subscriber; siblings are unaffected
//! ```
//!
//! Under `Block`, fan-out is sequential in registration order, so a stalled
//! subscriber also delays every subscriber registered after it.

/// Policy applied by the dispatcher when a delivery queue has no room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Wait for room, racing the subscriber's cancellation signal (default).
    #[default]
    Block,
    /// Drop the event for the full subscriber and move on to the next one.
    ///
    /// A rendezvous queue (buffer size 0) holds one pending event under this
    /// policy; only a second event arriving before it is taken is dropped.
    DropNewest,
}

impl BackpressurePolicy {
    /// Returns `true` if the policy may lose events.
    #[inline]
    pub fn is_lossy(&self) -> bool {
        matches!(self, BackpressurePolicy::DropNewest)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackpressurePolicy::Block => "block",
            BackpressurePolicy::DropNewest => "drop_newest",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lossless() {
        let policy = BackpressurePolicy::default();
        assert_eq!(policy, BackpressurePolicy::Block);
        assert!(!policy.is_lossy());
    }

    #[test]
    fn test_drop_newest_is_lossy() {
        assert!(BackpressurePolicy::DropNewest.is_lossy());
        assert_eq!(BackpressurePolicy::DropNewest.as_label(), "drop_newest");
    }
}
