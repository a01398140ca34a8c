//! Error types used by stream controllers and listeners.
//!
//! The broadcast surface itself never fails: `emit` after close is a no-op and a
//! rejected `listen` hands back an already-cancelled [`Subscription`](crate::Subscription).
//! The types below only surface through the opt-in `try_*` variants:
//!
//! - [`ListenError`] - a registration was refused by the controller.
//! - [`EmitError`] - a non-suspending emit could not hand the event over.
//!
//! Both provide `as_label` / `as_message` helpers for logs and metrics.

use std::sync::Arc;

use thiserror::Error;

/// Default error payload carried by [`StreamEvent::Error`](crate::StreamEvent::Error).
///
/// Cheap to clone, so one producer-side error can be handed to every subscriber.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced when registering a listener.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenError {
    /// The controller has begun closing (or is closed); no new subscribers are accepted.
    #[error("stream controller is closed")]
    Closed,

    /// The subscriber registry is full.
    #[error("subscriber limit of {max} reached")]
    LimitReached {
        /// The configured maximum number of live subscribers.
        max: usize,
    },
}

impl ListenError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use streamvisor::ListenError;
    ///
    /// let err = ListenError::LimitReached { max: 128 };
    /// assert_eq!(err.as_label(), "listen_limit_reached");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenError::Closed => "listen_closed",
            ListenError::LimitReached { .. } => "listen_limit_reached",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ListenError::Closed => "controller closed".to_string(),
            ListenError::LimitReached { max } => format!("registry full: max={max}"),
        }
    }
}

/// # Errors produced by the non-suspending emit variants.
///
/// Returned by [`StreamController::try_emit`](crate::StreamController::try_emit)
/// and [`StreamController::try_emit_error`](crate::StreamController::try_emit_error).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitError {
    /// The controller has begun closing; the event was discarded.
    #[error("stream controller is closed")]
    Closed,

    /// The input queue is full (the dispatcher is applying backpressure).
    #[error("input queue full")]
    Full,
}

impl EmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EmitError::Closed => "emit_closed",
            EmitError::Full => "emit_full",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EmitError::Closed => "controller closed".to_string(),
            EmitError::Full => "input queue full".to_string(),
        }
    }

    /// Indicates whether retrying the same emit later may succeed.
    ///
    /// ```
    /// use streamvisor::EmitError;
    ///
    /// assert!(EmitError::Full.is_retryable());
    /// assert!(!EmitError::Closed.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmitError::Full)
    }
}
