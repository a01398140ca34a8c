//! # Consumer-held cancellation handle.
//!
//! A [`Subscription`] is returned by every `listen` call. It carries:
//! - a `done` signal, raised by the first [`Subscription::cancel`];
//! - an optional cleanup action, run exactly once right after `done` is raised.
//!
//! ## Rules
//! - `cancel()` is idempotent under any number of concurrent callers, and every
//!   caller returns only once the cleanup has completed.
//! - A subscription returned for a rejected registration is **pre-cancelled**:
//!   `is_done()` is already `true` and no cleanup is attached.
//! - Dropping a subscription does **not** cancel it; the listener keeps running
//!   until `cancel()` or controller close.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

type Cleanup = Box<dyn FnOnce() + Send + 'static>;

struct Inner {
    done: CancellationToken,
    cleanup: Mutex<Option<Cleanup>>,
}

/// Cancellation handle for one listener.
///
/// Cheap to clone; all clones share the same `done` signal.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    /// Creates a live subscription with an optional cleanup action.
    pub fn new(cleanup: Option<Box<dyn FnOnce() + Send + 'static>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                done: CancellationToken::new(),
                cleanup: Mutex::new(cleanup),
            }),
        }
    }

    /// Creates a subscription that is already cancelled and has no cleanup.
    ///
    /// Returned for rejected registrations.
    pub fn cancelled() -> Self {
        let sub = Self::new(None);
        sub.inner.done.cancel();
        sub
    }

    /// Stops the listener.
    ///
    /// The first call raises `done` and then runs the cleanup action. Concurrent
    /// callers return only after that cleanup has finished; later calls are no-ops.
    pub fn cancel(&self) {
        // Held across the raise and the cleanup so no caller returns mid-effect.
        let mut cleanup = self
            .inner
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.done.cancel();
        if let Some(f) = cleanup.take() {
            f();
        }
    }

    /// Returns `true` once the subscription has been cancelled (or was rejected).
    #[inline]
    pub fn is_done(&self) -> bool {
        self.inner.done.is_cancelled()
    }

    /// Completes once the subscription is cancelled.
    pub async fn done(&self) {
        self.inner.done.cancelled().await
    }

    /// Signal observed by the delivery loop.
    pub(crate) fn done_token(&self) -> CancellationToken {
        self.inner.done.clone()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("done", &self.is_done())
            .finish()
    }
}
