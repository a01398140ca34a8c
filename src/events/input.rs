//! # Producer-facing input queue.
//!
//! [`Inlet`] is a thin wrapper around a bounded [`tokio::sync::mpsc`] channel that
//! carries events from any number of producer handles to the single dispatcher.
//!
//! ## Architecture
//! ```text
//! Producer handles:                      Consumer (one):
//!   emit()        ──┐
//!   emit_error()  ──┼──────► Inlet ───────► dispatcher loop
//!   try_emit()    ──┘   (bounded mpsc)     (in StreamController)
//! ```
//!
//! ## Rules
//! - **Closing wins**: once the termination token is cancelled, `send` returns
//!   without enqueuing, even if the queue has room.
//! - **Suspending send**: `send` waits for room, racing the termination token.
//! - **No teardown on close**: the sender side is never closed explicitly; a
//!   producer racing `force_close` observes a no-op, never a fault.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::EmitError;

/// Bounded input queue shared by every producer handle of one controller.
#[derive(Debug)]
pub(crate) struct Inlet<M> {
    tx: mpsc::Sender<M>,
    closing: CancellationToken,
}

impl<M> Inlet<M> {
    /// Creates the queue and returns the receiver for the dispatcher.
    ///
    /// The capacity is clamped to a minimum of 1.
    pub(crate) fn new(capacity: usize, closing: CancellationToken) -> (Self, mpsc::Receiver<M>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, closing }, rx)
    }

    /// Enqueues an event, suspending while the queue is full.
    ///
    /// Returns `false` if the controller began closing before the event was
    /// accepted (the event is discarded).
    pub(crate) async fn send(&self, msg: M) -> bool {
        if self.closing.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.closing.cancelled() => false,
            res = self.tx.send(msg) => res.is_ok(),
        }
    }

    /// Enqueues an event without suspending.
    pub(crate) fn try_send(&self, msg: M) -> Result<(), EmitError> {
        if self.closing.is_cancelled() {
            return Err(EmitError::Closed);
        }
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EmitError::Full,
            mpsc::error::TrySendError::Closed(_) => EmitError::Closed,
        })
    }
}
