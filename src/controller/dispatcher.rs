//! # Dispatcher: the single task that serializes and broadcasts events.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► next input event (preferred) ──► broadcast(event)
//!   │        └─ snapshot registry (lock released)
//!   │           for target in snapshot (registration order):
//!   │               deliver(event) ── full queue ──► wait for room | target cancelled
//!   │
//!   └─► termination signal ──► exit
//! }
//! On exit: close_all() (the only path that closes delivery queues), state = Closed
//! ```
//!
//! Events already accepted by the input queue when closing begins are still broadcast,
//! so everything a producer managed to emit before `force_close` reaches live subscribers.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::{
    events::StreamEvent,
    policies::BackpressurePolicy,
    subscribers::{Delivery, registry::Target},
};

use super::core::Shared;

pub(super) struct Dispatcher<T, E> {
    shared: Arc<Shared<T, E>>,
    rx: mpsc::Receiver<StreamEvent<T, E>>,
}

impl<T, E> Dispatcher<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(super) fn new(shared: Arc<Shared<T, E>>, rx: mpsc::Receiver<StreamEvent<T, E>>) -> Self {
        Self { shared, rx }
    }

    pub(super) async fn run(mut self) {
        let name = self.shared.config.name;
        debug!(
            controller = name,
            backpressure = self.shared.config.backpressure.as_label(),
            "dispatcher started"
        );

        loop {
            let event = tokio::select! {
                biased;
                ev = self.rx.recv() => match ev {
                    Some(ev) => ev,
                    None => break,
                },
                _ = self.shared.closing.cancelled() => break,
            };
            self.broadcast(event).await;
        }

        let closed = self.shared.registry.close_all();
        self.shared.state.mark_closed();
        debug!(controller = name, closed, "dispatcher stopped");
    }

    async fn broadcast(&self, event: StreamEvent<T, E>) {
        let targets = self.shared.registry.snapshot();
        let policy = self.shared.config.backpressure;

        let Some((last, rest)) = targets.split_last() else {
            trace!(
                controller = self.shared.config.name,
                kind = event.as_label(),
                "no subscribers; event discarded"
            );
            return;
        };
        for target in rest {
            self.deliver(target, event.clone(), policy).await;
        }
        self.deliver(last, event, policy).await;
    }

    async fn deliver(
        &self,
        target: &Target<StreamEvent<T, E>>,
        event: StreamEvent<T, E>,
        policy: BackpressurePolicy,
    ) {
        let name = self.shared.config.name;
        match target.deliver(event, policy).await {
            Delivery::Delivered => {}
            Delivery::Cancelled => {
                trace!(
                    controller = name,
                    subscriber = target.id(),
                    "skipped cancelled subscriber"
                );
            }
            Delivery::Dropped => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    controller = name,
                    subscriber = target.id(),
                    "queue full; event dropped"
                );
            }
            Delivery::Gone => {
                trace!(
                    controller = name,
                    subscriber = target.id(),
                    "delivery task gone"
                );
            }
        }
    }
}
