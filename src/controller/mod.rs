//! Stream controller: producer surface, dispatcher, and stream views.
//!
//! ## Wiring
//! ```text
//! producer ── emit / emit_error ──► Inlet (bounded mpsc) ──► Dispatcher task
//!                                                               │ snapshot (lock released)
//!                                            ┌──────────────────┼──────────────────┐
//!                                            ▼                  ▼                  ▼
//!                                       [queue 1]          [queue 2]   ...    [queue N]
//!                                            │                  │                  │
//!                                     delivery task 1    delivery task 2    delivery task N
//!                                            │                  │                  │
//!                                     on_data/on_error   on_data/on_error   on_data/on_error
//!
//! Teardown:
//!   Subscription::cancel() ──► done raised ──► cleanup: raise subscriber signal, unregister
//!   force_close()          ──► closing token ──► Dispatcher closes every queue, exits
//!   wait()                 ──► TaskTracker (dispatcher + every delivery task) drained
//! ```
//!
//! Internal modules:
//! - [`core`]: `StreamController` handle and the state it shares with its tasks;
//! - [`dispatcher`]: the broadcast loop;
//! - [`stream`]: `Stream` views and per-subscription delivery tasks;
//! - [`state`]: `Open → Closing → Closed` lifecycle.

mod core;
mod dispatcher;
mod state;
mod stream;


pub use core::StreamController;
pub use state::ControllerState;
pub use stream::Stream;
