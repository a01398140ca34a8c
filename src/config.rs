//! # Stream controller configuration.
//!
//! Provides [`ControllerConfig`] centralized settings for a
//! [`StreamController`](crate::StreamController).
//!
//! ## Sentinel values
//! - `input_capacity = 0` → clamped to 1 (the input queue is never unbounded)
//! - `default_buffer = 0` → rendezvous delivery: the dispatcher waits until the
//!   listener has taken each event (under `DropNewest` one pending event is kept)
//! - `max_subscribers = 0` → clamped to 1

use crate::policies::BackpressurePolicy;

/// Hard cap on live subscribers per controller.
///
/// Registrations beyond this limit are rejected exactly like registrations on a
/// closing controller.
pub const MAX_SUBSCRIBERS: usize = 128;

/// Delivery queue capacity used when a stream does not request one.
pub const DEFAULT_BUFFER: usize = 2;

/// Configuration for a stream controller.
///
/// ## Field semantics
/// - `name`: label attached to every log record of this controller
/// - `input_capacity`: producer-side queue size (min 1)
/// - `default_buffer`: per-subscriber delivery queue size when none is requested
/// - `max_subscribers`: registry cap (min 1)
/// - `backpressure`: what the dispatcher does when a delivery queue is full
///
/// ## Notes
/// All fields are public. Prefer the clamping accessors over reading fields directly.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Label used in log records (`controller = name`).
    pub name: &'static str,

    /// Capacity of the producer-facing input queue.
    ///
    /// `emit` suspends while the queue is full, until the dispatcher takes an
    /// event or the controller closes. Small values keep producers in lockstep
    /// with the dispatcher.
    pub input_capacity: usize,

    /// Delivery queue capacity for streams created without an explicit size.
    pub default_buffer: usize,

    /// Maximum number of live subscribers.
    pub max_subscribers: usize,

    /// Policy applied when a subscriber's delivery queue is full.
    pub backpressure: BackpressurePolicy,
}

impl ControllerConfig {
    /// Returns the input queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn input_capacity_clamped(&self) -> usize {
        self.input_capacity.max(1)
    }

    /// Returns the subscriber cap clamped to a minimum of 1.
    #[inline]
    pub fn max_subscribers_clamped(&self) -> usize {
        self.max_subscribers.max(1)
    }

    /// Resolves a requested delivery buffer size.
    ///
    /// - `None` → `default_buffer`
    /// - `Some(n)` → `n` (0 means rendezvous)
    #[inline]
    pub fn resolve_buffer(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_buffer)
    }
}

impl Default for ControllerConfig {
    /// Default configuration:
    ///
    /// - `name = "stream"`
    /// - `input_capacity = 1` (producer waits for the dispatcher)
    /// - `default_buffer = 2`
    /// - `max_subscribers = 128`
    /// - `backpressure = BackpressurePolicy::Block`
    fn default() -> Self {
        Self {
            name: "stream",
            input_capacity: 1,
            default_buffer: DEFAULT_BUFFER,
            max_subscribers: MAX_SUBSCRIBERS,
            backpressure: BackpressurePolicy::default(),
        }
    }
}
