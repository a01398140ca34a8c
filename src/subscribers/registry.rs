//! # Subscriber registry - insertion-ordered set of live delivery queues.
//!
//! Registry owns one [`Record`] per live subscriber:
//! - `register` → appends a record (bounded delivery queue + cancellation signal)
//! - `remove` → raises the cancellation signal, then drops the record from the set
//! - `snapshot` → point-in-time copy used by the dispatcher for one broadcast
//! - `close_all` → closes every delivery queue (dispatcher termination only)
//!
//! ## Architecture
//! ```text
//! listen() ──► register() ──► Vec<Record> (registration order)
//!                                  │
//! dispatcher ──► snapshot() ───────┘──► Vec<Target> ──► Target::deliver() (lock released)
//!
//! Subscription::cancel() ──► remove() ──► cancel signal raised, record moved to `retired`
//! dispatcher termination ──► close_all() ──► every sender dropped (queues closed)
//! ```
//!
//! ## Rules
//! - The lock is held only for append / remove / snapshot / drain; never across a send.
//! - A delivery queue is closed by the dispatcher alone. `remove` parks the sender in
//!   `retired`; the dispatcher drops retired senders on its next snapshot or on termination.
//! - `register` and `remove` prune retired senders whose delivery task has already
//!   exited. Dropping those closes nothing, and keeps `retired` bounded by the number
//!   of removed listeners still running a callback.
//! - Registration re-checks the closing signal and the cap **under the lock**.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::{TaskTracker, task_tracker::TaskTrackerToken};

use crate::error::ListenError;
use crate::policies::BackpressurePolicy;

/// Identity of one registration, shared by the controller and the subscription cleanup.
#[derive(Clone, Debug)]
pub(crate) struct SubscriberHandle {
    id: u64,
    cancelled: CancellationToken,
}

impl SubscriberHandle {
    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Raises the cancellation signal observed by an in-flight broadcast.
    #[inline]
    pub(crate) fn raise(&self) {
        self.cancelled.cancel();
    }
}

/// Everything a successful registration hands to the new delivery task.
pub(crate) struct Registration<M> {
    pub(crate) handle: SubscriberHandle,
    pub(crate) rx: mpsc::Receiver<M>,
    /// Keeps the controller's completion barrier open until the delivery task exits.
    pub(crate) barrier: TaskTrackerToken,
}

/// Registry entry: the only long-lived sender of a delivery queue.
struct Record<M> {
    id: u64,
    tx: mpsc::Sender<M>,
    rendezvous: bool,
    cancelled: CancellationToken,
}

struct State<M> {
    next_id: u64,
    records: Vec<Record<M>>,
    retired: Vec<mpsc::Sender<M>>,
}

impl<M> State<M> {
    /// Drops retired senders whose receiver is already gone.
    fn prune_retired(&mut self) {
        self.retired.retain(|tx| !tx.is_closed());
    }
}

/// Thread-safe registry of live subscribers.
pub(crate) struct Registry<M> {
    state: Mutex<State<M>>,
    max: usize,
}

impl<M> Registry<M> {
    /// Creates an empty registry holding at most `max` subscribers.
    pub(crate) fn new(max: usize) -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 0,
                records: Vec::new(),
                retired: Vec::new(),
            }),
            max: max.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<M>> {
        // Every mutation below leaves the state consistent, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a subscriber with a delivery queue of `capacity` (0 = rendezvous).
    pub(crate) fn register(
        &self,
        capacity: usize,
        closing: &CancellationToken,
        barrier: &TaskTracker,
    ) -> Result<Registration<M>, ListenError> {
        let mut state = self.lock();
        state.prune_retired();

        if closing.is_cancelled() {
            return Err(ListenError::Closed);
        }
        if state.records.len() >= self.max {
            return Err(ListenError::LimitReached { max: self.max });
        }

        let id = state.next_id;
        state.next_id += 1;

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancelled = CancellationToken::new();
        state.records.push(Record {
            id,
            tx,
            rendezvous: capacity == 0,
            cancelled: cancelled.clone(),
        });

        Ok(Registration {
            handle: SubscriberHandle { id, cancelled },
            rx,
            barrier: barrier.token(),
        })
    }

    /// Cancels and removes a subscriber. Returns `false` if it was already gone.
    ///
    /// The signal is raised before the lock is taken, so a dispatcher blocked on
    /// this subscriber is released even while the lock is contended.
    pub(crate) fn remove(&self, handle: &SubscriberHandle) -> bool {
        handle.raise();

        let mut state = self.lock();
        state.prune_retired();
        let Some(pos) = state.records.iter().position(|r| r.id == handle.id) else {
            return false;
        };
        let record = state.records.remove(pos);
        state.retired.push(record.tx);
        true
    }

    /// Copies the live set for one broadcast and drops retired senders.
    pub(crate) fn snapshot(&self) -> Vec<Target<M>> {
        let (targets, retired) = {
            let mut state = self.lock();
            let targets = state
                .records
                .iter()
                .map(|r| Target {
                    id: r.id,
                    tx: r.tx.clone(),
                    rendezvous: r.rendezvous,
                    cancelled: r.cancelled.clone(),
                })
                .collect::<Vec<_>>();
            (targets, std::mem::take(&mut state.retired))
        };
        drop(retired);
        targets
    }

    /// Closes every delivery queue and clears the registry.
    ///
    /// Returns the number of live subscribers whose queues were closed.
    pub(crate) fn close_all(&self) -> usize {
        let (records, retired) = {
            let mut state = self.lock();
            (
                std::mem::take(&mut state.records),
                std::mem::take(&mut state.retired),
            )
        };
        let n = records.len();
        drop(records);
        drop(retired);
        n
    }

    /// Number of live subscribers.
    pub(crate) fn len(&self) -> usize {
        self.lock().records.len()
    }
}

/// Outcome of delivering one event to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The event is in the subscriber's queue (or taken, for rendezvous queues).
    Delivered,
    /// The subscriber was cancelled before the event could be handed over.
    Cancelled,
    /// The queue was full and the policy allows dropping.
    Dropped,
    /// The delivery task is gone (receiver dropped).
    Gone,
}

/// Point-in-time copy of a record, used outside the registry lock.
pub(crate) struct Target<M> {
    id: u64,
    tx: mpsc::Sender<M>,
    rendezvous: bool,
    cancelled: CancellationToken,
}

impl<M> Target<M> {
    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Hands `msg` to the subscriber's queue under the given policy.
    ///
    /// With [`BackpressurePolicy::Block`] a full queue suspends until either the
    /// queue has room or the subscriber's cancellation signal is raised. A rendezvous
    /// queue additionally waits until the delivery task has taken the event.
    pub(crate) async fn deliver(&self, msg: M, policy: BackpressurePolicy) -> Delivery {
        if self.cancelled.is_cancelled() {
            return Delivery::Cancelled;
        }

        match policy {
            BackpressurePolicy::DropNewest => match self.tx.try_send(msg) {
                Ok(()) => Delivery::Delivered,
                Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
                Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Gone,
            },
            BackpressurePolicy::Block => {
                let permit = tokio::select! {
                    biased;
                    _ = self.cancelled.cancelled() => return Delivery::Cancelled,
                    permit = self.tx.reserve() => match permit {
                        Ok(p) => p,
                        Err(_) => return Delivery::Gone,
                    },
                };
                permit.send(msg);

                if self.rendezvous {
                    // Room reappears once the delivery task has received the event. A task
                    // that takes its last event and exits closes the queue instead, which
                    // still counts as a hand-over.
                    tokio::select! {
                        biased;
                        _ = self.cancelled.cancelled() => return Delivery::Cancelled,
                        _ = self.tx.reserve() => {}
                    }
                }
                Delivery::Delivered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fixture(max: usize) -> (Registry<u32>, CancellationToken, TaskTracker) {
        (Registry::new(max), CancellationToken::new(), TaskTracker::new())
    }

    #[tokio::test]
    async fn test_register_respects_cap() {
        let (reg, closing, tracker) = fixture(2);

        let _a = reg.register(1, &closing, &tracker).unwrap();
        let _b = reg.register(1, &closing, &tracker).unwrap();
        let err = reg.register(1, &closing, &tracker).err();

        assert_eq!(err, Some(ListenError::LimitReached { max: 2 }));
        assert_eq!(reg.len(), 2);
    }

    #[tokio::test]
    async fn test_register_rejected_when_closing() {
        let (reg, closing, tracker) = fixture(4);
        closing.cancel();

        let err = reg.register(1, &closing, &tracker).err();
        assert_eq!(err, Some(ListenError::Closed));
        assert_eq!(reg.len(), 0);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_and_keeps_queue_open() {
        let (reg, closing, tracker) = fixture(4);
        let mut r = reg.register(1, &closing, &tracker).unwrap();

        assert!(reg.remove(&r.handle));
        assert!(!reg.remove(&r.handle));
        assert_eq!(reg.len(), 0);

        // The retired sender still holds the queue open until the dispatcher drains it.
        assert!(matches!(
            r.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));

        let _ = reg.snapshot();
        assert!(matches!(
            r.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_retired_keeps_only_running_listeners() {
        let (reg, closing, tracker) = fixture(4);

        let mut running = reg.register(1, &closing, &tracker).unwrap();
        reg.remove(&running.handle);

        for _ in 0..10_000 {
            let r = reg.register(2, &closing, &tracker).unwrap();
            assert!(reg.remove(&r.handle));
        }

        // Every churned receiver is gone; only the last one awaits the next prune.
        let retired = reg.lock().retired.len();
        assert!(retired <= 2, "retired senders grew to {retired}");
        assert!(matches!(
            running.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));
        assert_eq!(reg.len(), 0);
    }

    #[tokio::test]
    async fn test_close_all_closes_queues() {
        let (reg, closing, tracker) = fixture(4);
        let mut a = reg.register(1, &closing, &tracker).unwrap();
        let mut b = reg.register(1, &closing, &tracker).unwrap();

        assert_eq!(reg.close_all(), 2);
        assert_eq!(a.rx.recv().await, None);
        assert_eq!(b.rx.recv().await, None);
        assert!(!reg.remove(&a.handle));
    }

    #[tokio::test]
    async fn test_snapshot_preserves_registration_order() {
        let (reg, closing, tracker) = fixture(8);
        let regs: Vec<_> = (0..4)
            .map(|_| reg.register(1, &closing, &tracker).unwrap())
            .collect();
        reg.remove(&regs[1].handle);

        let ids: Vec<u64> = reg.snapshot().iter().map(Target::id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_blocked_deliver_released_by_cancel() {
        let (reg, closing, tracker) = fixture(4);
        let r = reg.register(1, &closing, &tracker).unwrap();
        let target = reg.snapshot().pop().unwrap();

        assert_eq!(
            target.deliver(1, BackpressurePolicy::Block).await,
            Delivery::Delivered
        );

        let handle = r.handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.raise();
        });

        let out = tokio::time::timeout(
            Duration::from_secs(2),
            target.deliver(2, BackpressurePolicy::Block),
        )
        .await
        .expect("cancel should release the blocked delivery");
        assert_eq!(out, Delivery::Cancelled);
    }

    #[tokio::test]
    async fn test_drop_newest_drops_when_full() {
        let (reg, closing, tracker) = fixture(4);
        let mut r = reg.register(1, &closing, &tracker).unwrap();
        let target = reg.snapshot().pop().unwrap();

        let policy = BackpressurePolicy::DropNewest;
        assert_eq!(target.deliver(1, policy).await, Delivery::Delivered);
        assert_eq!(target.deliver(2, policy).await, Delivery::Dropped);
        assert_eq!(r.rx.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_rendezvous_waits_for_receiver() {
        let (reg, closing, tracker) = fixture(4);
        let mut r = reg.register(0, &closing, &tracker).unwrap();
        let target = reg.snapshot().pop().unwrap();

        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            target.deliver(7, BackpressurePolicy::Block),
        )
        .await;
        assert!(pending.is_err(), "rendezvous must wait for the receiver");

        let (release, released) = tokio::sync::oneshot::channel::<()>();
        let consumer = tokio::spawn(async move {
            let first = r.rx.recv().await;
            let second = r.rx.recv().await;
            let _ = released.await;
            (first, second)
        });
        let out = tokio::time::timeout(
            Duration::from_secs(2),
            target.deliver(8, BackpressurePolicy::Block),
        )
        .await
        .expect("receiver drains the queue");
        assert_eq!(out, Delivery::Delivered);

        let _ = release.send(());
        assert_eq!(consumer.await.unwrap(), (Some(7), Some(8)));
    }

    #[tokio::test]
    async fn test_rendezvous_counts_last_event_before_exit() {
        let (reg, closing, tracker) = fixture(4);
        let mut r = reg.register(0, &closing, &tracker).unwrap();
        let target = reg.snapshot().pop().unwrap();

        let consumer = tokio::spawn(async move { r.rx.recv().await });
        let out = tokio::time::timeout(
            Duration::from_secs(2),
            target.deliver(9, BackpressurePolicy::Block),
        )
        .await
        .expect("exiting receiver releases the rendezvous");

        assert_eq!(out, Delivery::Delivered);
        assert_eq!(consumer.await.unwrap(), Some(9));
    }

    #[tokio::test]
    async fn test_drop_newest_rendezvous_holds_one_slot() {
        let (reg, closing, tracker) = fixture(4);
        let mut r = reg.register(0, &closing, &tracker).unwrap();
        let target = reg.snapshot().pop().unwrap();

        let policy = BackpressurePolicy::DropNewest;
        assert_eq!(target.deliver(1, policy).await, Delivery::Delivered);
        assert_eq!(target.deliver(2, policy).await, Delivery::Dropped);
        assert_eq!(r.rx.recv().await, Some(1));
    }
}
