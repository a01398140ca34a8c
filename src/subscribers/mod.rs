//! # Stream listeners and the subscriber registry.
//!
//! This module provides the [`Listen`] trait and the internal bookkeeping that connects
//! a listener to the dispatcher of a [`StreamController`](crate::StreamController).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   emit(event) ──► dispatcher ──► Registry::snapshot() ──► Target::deliver()
//!                                                               │
//!                                             [bounded queue per subscriber]
//!                                                               │
//!                                                  delivery task ──► Listen::on_data / on_error
//! ```
//!
//! ## Listener types
//! - **Closures** - `Stream::listen(on_data, on_error)` wraps them in a callback listener
//! - **Trait objects** - `Stream::listen_with(Arc<dyn Listen<T, E>>)` for async handlers

mod callback;
mod listen;
pub(crate) mod registry;

pub(crate) use callback::CallbackListener;
pub use listen::Listen;
pub(crate) use registry::{Delivery, Registration, Registry, SubscriberHandle};
