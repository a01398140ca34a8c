//! # streamvisor
//!
//! **Streamvisor** is a broadcast event-stream primitive for Tokio.
//!
//! A single producer emits typed data items or typed errors through a
//! [`StreamController`]; any number of independently-paced listeners each receive a
//! copy of every event, in order, for as long as they stay subscribed. It is meant
//! as a building block for pub/sub buses, fan-out layers and reactive pipelines.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐
//!     │   Producer   │  emit(data) / emit_error(err) / close()
//!     └──────┬───────┘
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  StreamController (cheap to clone)                                │
//! │  - Inlet (bounded input queue, closing always wins)               │
//! │  - Registry (insertion-ordered subscribers, cap = 128)            │
//! │  - TaskTracker (dispatcher + every delivery task)                 │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                   ┌────────────────────────┐
//!                   │       Dispatcher       │  one task per controller
//!                   │ snapshot → deliver in  │
//!                   │  registration order    │
//!                   └───┬────────┬────────┬──┘
//!                       ▼        ▼        ▼
//!                   [queue 1][queue 2][queue N]   bounded, per subscriber
//!                       ▼        ▼        ▼
//!                   delivery delivery delivery    one task per Subscription
//!                       ▼        ▼        ▼
//!                  on_data / on_error (closures or `Listen` impls)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Open ──force_close()──► Closing ──dispatcher exit──► Closed
//!
//! Open:    emit accepted, listen registers (until the cap is reached)
//! Closing: emit is a silent no-op, listen returns a pre-cancelled Subscription,
//!          already-accepted events are still broadcast
//! Closed:  every delivery queue closed; delivery tasks drain and exit
//! ```
//!
//! ## Backpressure
//! With the default [`BackpressurePolicy::Block`], a full delivery queue suspends the
//! dispatcher until that subscriber drains or is cancelled. Nothing is dropped, and a
//! slow subscriber delays every subscriber registered after it. Cancelling the
//! subscription releases the dispatcher right away.
//! [`BackpressurePolicy::DropNewest`] trades completeness for latency.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                       |
//! |-------------------|--------------------------------------------------------------|------------------------------------------|
//! | **Producer**      | Emit data or errors, close and wait.                         | [`StreamController`]                     |
//! | **Consumers**     | Create subscriptions with a chosen buffer size.              | [`Stream`], [`Listen`]                   |
//! | **Cancellation**  | Idempotent, exactly-once cancel with cleanup.                | [`Subscription`]                         |
//! | **Events**        | Data-or-error payload.                                       | [`StreamEvent`]                          |
//! | **Policies**      | Behaviour of full delivery queues.                           | [`BackpressurePolicy`]                   |
//! | **Errors**        | Opt-in typed errors for `try_*` operations.                  | [`ListenError`], [`EmitError`]           |
//! | **Configuration** | Capacities, subscriber cap, log label.                       | [`ControllerConfig`]                     |
//!
//! ## Example
//! ```rust
//! use streamvisor::StreamController;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let ctrl: StreamController<i32, String> = StreamController::new();
//!
//!     let sub = ctrl.stream().listen(
//!         |n| println!("data: {n}"),
//!         |err| println!("error: {err}"),
//!     );
//!     assert!(!sub.is_done());
//!
//!     ctrl.emit(10).await;
//!     ctrl.emit(20).await;
//!     ctrl.emit_error("boom".to_string()).await;
//!
//!     // Waits for every listener to see all three events.
//!     ctrl.close().await;
//! }
//! ```
mod config;
mod controller;
mod error;
mod events;
mod policies;
mod subscribers;
mod subscription;

// ---- Public re-exports ----

pub use config::{ControllerConfig, DEFAULT_BUFFER, MAX_SUBSCRIBERS};
pub use controller::{ControllerState, Stream, StreamController};
pub use error::{EmitError, ListenError, SharedError};
pub use events::StreamEvent;
pub use policies::BackpressurePolicy;
pub use subscribers::Listen;
pub use subscription::Subscription;
