use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

use crate::{
    config::ControllerConfig,
    error::{EmitError, ListenError, SharedError},
    events::{Inlet, StreamEvent},
    subscribers::{Registration, Registry, SubscriberHandle},
};

use super::{
    dispatcher::Dispatcher,
    state::{ControllerState, StateCell},
    stream::Stream,
};

/// State shared by every handle of one controller, its dispatcher, and subscription cleanups.
pub(crate) struct Shared<T, E> {
    pub(super) config: ControllerConfig,
    pub(super) state: StateCell,
    /// Termination signal observed by producers and the dispatcher.
    pub(super) closing: CancellationToken,
    pub(super) inlet: Inlet<StreamEvent<T, E>>,
    pub(super) registry: Registry<StreamEvent<T, E>>,
    /// Completion barrier: the dispatcher plus every delivery task.
    pub(super) barrier: TaskTracker,
    pub(super) dropped: AtomicU64,
}

impl<T, E> Shared<T, E> {
    /// Registers a new subscriber with the requested delivery capacity.
    ///
    /// Fails with [`ListenError::Closed`] once closing has begun, or
    /// [`ListenError::LimitReached`] when the registry is full. Both conditions
    /// are checked again under the registry lock.
    pub(super) fn subscribe(
        &self,
        buffer_size: Option<usize>,
    ) -> Result<Registration<StreamEvent<T, E>>, ListenError> {
        if self.state.get() != ControllerState::Open {
            return Err(ListenError::Closed);
        }

        let capacity = self.config.resolve_buffer(buffer_size);
        match self
            .registry
            .register(capacity, &self.closing, &self.barrier)
        {
            Ok(reg) => {
                trace!(
                    controller = self.config.name,
                    subscriber = reg.handle.id(),
                    capacity,
                    "subscriber registered"
                );
                Ok(reg)
            }
            Err(err) => {
                debug!(
                    controller = self.config.name,
                    reason = err.as_label(),
                    "subscription rejected"
                );
                Err(err)
            }
        }
    }

    /// Cancels and unregisters a subscriber.
    ///
    /// The subscriber's signal is raised before the registry is touched, releasing
    /// a dispatcher blocked on it. The delivery queue is left for the dispatcher to close.
    pub(super) fn remove_subscriber(&self, handle: &SubscriberHandle) {
        if self.registry.remove(handle) {
            trace!(
                controller = self.config.name,
                subscriber = handle.id(),
                "subscriber removed"
            );
        }
    }

    /// Raises the termination signal. Only the first caller has any effect.
    pub(super) fn force_close(&self) {
        if !self.state.begin_closing() {
            return;
        }
        debug!(controller = self.config.name, "stream controller closing");
        self.closing.cancel();
        self.barrier.close();
    }
}

/// Force-closes the controller when the last user-facing handle is dropped.
struct CloseOnDrop<T, E>(Arc<Shared<T, E>>);

impl<T, E> Drop for CloseOnDrop<T, E> {
    fn drop(&mut self) {
        self.0.force_close();
    }
}

/// Producer side of a broadcast stream.
///
/// Owns the input queue, the subscriber registry and the dispatcher task.
/// Cheap to clone; all clones drive the same dispatcher. When the last clone
/// (including clones held by [`Stream`] views) is dropped, the controller is
/// force-closed.
///
/// ## Example
/// ```rust
/// use streamvisor::StreamController;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let ctrl: StreamController<u32, String> = StreamController::new();
///     let _sub = ctrl.stream().listen(
///         |n| println!("data: {n}"),
///         |err| println!("error: {err}"),
///     );
///
///     ctrl.emit(10).await;
///     ctrl.emit_error("boom".to_string()).await;
///     ctrl.close().await;
/// }
/// ```
pub struct StreamController<T, E = SharedError> {
    shared: Arc<Shared<T, E>>,
    _guard: Arc<CloseOnDrop<T, E>>,
}

impl<T, E> Clone for StreamController<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _guard: Arc::clone(&self._guard),
        }
    }
}

impl<T, E> StreamController<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates an open controller with the default configuration and starts its dispatcher.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Creates an open controller with the given configuration and starts its dispatcher.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn with_config(config: ControllerConfig) -> Self {
        let closing = CancellationToken::new();
        let (inlet, rx) = Inlet::new(config.input_capacity_clamped(), closing.clone());
        let registry = Registry::new(config.max_subscribers_clamped());

        let shared = Arc::new(Shared {
            config,
            state: StateCell::new(),
            closing,
            inlet,
            registry,
            barrier: TaskTracker::new(),
            dropped: AtomicU64::new(0),
        });

        let dispatcher = Dispatcher::new(Arc::clone(&shared), rx);
        shared.barrier.spawn(dispatcher.run());

        Self {
            _guard: Arc::new(CloseOnDrop(Arc::clone(&shared))),
            shared,
        }
    }

    /// Emits a data item to every live subscriber.
    ///
    /// Suspends while the input queue is full. Once the controller has begun
    /// closing this is a silent no-op.
    pub async fn emit(&self, data: T) {
        if !self.shared.inlet.send(StreamEvent::Data(data)).await {
            trace!(
                controller = self.shared.config.name,
                "emit ignored: closing"
            );
        }
    }

    /// Emits an error to every live subscriber. Same contract as [`emit`](Self::emit).
    pub async fn emit_error(&self, err: E) {
        if !self.shared.inlet.send(StreamEvent::Error(err)).await {
            trace!(
                controller = self.shared.config.name,
                "emit_error ignored: closing"
            );
        }
    }

    /// Emits a data item without suspending.
    ///
    /// Fails with [`EmitError::Full`] if the dispatcher has not taken the previous
    /// events yet, or [`EmitError::Closed`] after closing began.
    pub fn try_emit(&self, data: T) -> Result<(), EmitError> {
        self.shared.inlet.try_send(StreamEvent::Data(data))
    }

    /// Emits an error without suspending. Same contract as [`try_emit`](Self::try_emit).
    pub fn try_emit_error(&self, err: E) -> Result<(), EmitError> {
        self.shared.inlet.try_send(StreamEvent::Error(err))
    }

    /// Returns a view that creates subscriptions with the default buffer size.
    ///
    /// Never fails, even after close; registration failure surfaces in `listen`.
    pub fn stream(&self) -> Stream<T, E> {
        Stream::new(self.clone(), None)
    }

    /// Returns a view that creates subscriptions with a delivery queue of `buffer_size`.
    ///
    /// `0` makes delivery a rendezvous: the dispatcher waits until the listener has taken
    /// each event.
    pub fn stream_with_buffer(&self, buffer_size: usize) -> Stream<T, E> {
        Stream::new(self.clone(), Some(buffer_size))
    }
}

impl<T, E> StreamController<T, E> {
    /// Raises the termination signal without waiting.
    ///
    /// Idempotent; safe under concurrent callers and concurrent `emit`.
    pub fn force_close(&self) {
        self.shared.force_close();
    }

    /// Closes the controller and waits for the dispatcher and every delivery task to exit.
    pub async fn close(&self) {
        self.force_close();
        self.wait().await;
    }

    /// Waits until the dispatcher and every delivery task have exited.
    ///
    /// Only completes after closing has begun. Safe to call from many tasks.
    pub async fn wait(&self) {
        self.shared.barrier.wait().await;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.shared.state.get()
    }

    /// Returns `true` once closing has begun.
    pub fn is_closed(&self) -> bool {
        self.state() != ControllerState::Open
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Number of per-subscriber deliveries dropped by a lossy backpressure policy.
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Configuration this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }

    pub(super) fn shared(&self) -> &Arc<Shared<T, E>> {
        &self.shared
    }
}

impl<T, E> Default for StreamController<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for StreamController<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamController")
            .field("name", &self.shared.config.name)
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
