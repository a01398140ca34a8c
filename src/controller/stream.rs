//! # Stream views and per-subscription delivery tasks.
//!
//! A [`Stream`] is a reusable factory bound to a controller and a buffer size.
//! Each successful `listen*` call registers a subscriber and spawns one delivery task:
//!
//! ```text
//! loop {
//!   ├─► subscription done (preferred) ──► exit, discarding buffered events
//!   ├─► queue closed                  ──► exit (controller terminated)
//!   └─► event
//!         ├─ Data(v)  ──► listener.on_data(v)
//!         └─ Error(e) ──► listener.on_error(e)
//!               └─ panic caught ──► tracing::warn!, continue
//! }
//! ```
//!
//! The task holds a completion-barrier token from the moment of registration, so
//! `StreamController::wait` never returns while a registered listener is still running.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::{
    error::{ListenError, SharedError},
    events::StreamEvent,
    subscribers::{CallbackListener, Listen, Registration},
    subscription::Subscription,
};

use super::core::StreamController;

/// Subscription factory bound to a [`StreamController`].
///
/// Construction never fails; a `listen` on a closed or full controller returns a
/// pre-cancelled [`Subscription`] (`is_done()` is already `true`).
pub struct Stream<T, E = SharedError> {
    controller: StreamController<T, E>,
    buffer_size: Option<usize>,
}

impl<T, E> Clone for Stream<T, E> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

impl<T, E> Stream<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(super) fn new(controller: StreamController<T, E>, buffer_size: Option<usize>) -> Self {
        Self {
            controller,
            buffer_size,
        }
    }

    /// Requested delivery queue capacity (`None` = controller default).
    pub fn buffer_size(&self) -> Option<usize> {
        self.buffer_size
    }

    /// Starts listening with a data callback and an error callback.
    ///
    /// Both callbacks run inside this subscription's own delivery task.
    pub fn listen<FD, FE>(&self, on_data: FD, on_error: FE) -> Subscription
    where
        FD: FnMut(T) + Send + 'static,
        FE: FnMut(E) + Send + 'static,
    {
        self.listen_with(Arc::new(CallbackListener::new(on_data, Some(on_error))))
    }

    /// Starts listening with a data callback only; errors are dropped.
    pub fn listen_data<FD>(&self, on_data: FD) -> Subscription
    where
        FD: FnMut(T) + Send + 'static,
    {
        self.listen_with(Arc::new(CallbackListener::new(on_data, None::<fn(E)>)))
    }

    /// Starts listening with an async [`Listen`] implementation.
    pub fn listen_with(&self, listener: Arc<dyn Listen<T, E>>) -> Subscription {
        self.try_listen_with(listener)
            .unwrap_or_else(|_| Subscription::cancelled())
    }

    /// Like [`listen`](Self::listen), but reports why a registration was refused.
    pub fn try_listen<FD, FE>(&self, on_data: FD, on_error: FE) -> Result<Subscription, ListenError>
    where
        FD: FnMut(T) + Send + 'static,
        FE: FnMut(E) + Send + 'static,
    {
        self.try_listen_with(Arc::new(CallbackListener::new(on_data, Some(on_error))))
    }

    /// Like [`listen_with`](Self::listen_with), but reports why a registration was refused.
    pub fn try_listen_with(
        &self,
        listener: Arc<dyn Listen<T, E>>,
    ) -> Result<Subscription, ListenError> {
        let shared = self.controller.shared();
        let Registration {
            handle,
            rx,
            barrier,
        } = shared.subscribe(self.buffer_size)?;

        let weak = Arc::downgrade(shared);
        let cleanup_handle = handle.clone();
        let subscription = Subscription::new(Some(Box::new(move || match weak.upgrade() {
            Some(shared) => shared.remove_subscriber(&cleanup_handle),
            None => cleanup_handle.raise(),
        })));

        let task = DeliveryTask {
            listener,
            rx,
            done: subscription.done_token(),
            controller: shared.config.name,
            subscriber: handle.id(),
        };
        tokio::spawn(async move {
            let _barrier = barrier;
            task.run().await;
        });

        Ok(subscription)
    }
}

impl<T, E> fmt::Debug for Stream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("controller", &self.controller)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

struct DeliveryTask<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    listener: Arc<dyn Listen<T, E>>,
    rx: mpsc::Receiver<StreamEvent<T, E>>,
    done: CancellationToken,
    controller: &'static str,
    subscriber: u64,
}

impl<T, E> DeliveryTask<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    async fn run(mut self) {
        trace!(
            controller = self.controller,
            subscriber = self.subscriber,
            listener = self.listener.name(),
            "delivery started"
        );

        loop {
            let event = tokio::select! {
                biased;
                _ = self.done.cancelled() => break,
                ev = self.rx.recv() => match ev {
                    Some(ev) => ev,
                    None => break,
                },
            };

            let fut = match event {
                StreamEvent::Data(v) => self.listener.on_data(v),
                StreamEvent::Error(e) => self.listener.on_error(e),
            };
            if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
                warn!(
                    controller = self.controller,
                    subscriber = self.subscriber,
                    listener = self.listener.name(),
                    panic = %panic_message(panic_err.as_ref()),
                    "listener panicked"
                );
            }
        }

        trace!(
            controller = self.controller,
            subscriber = self.subscriber,
            cancelled = self.done.is_cancelled(),
            "delivery stopped"
        );
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
