//! Stream events: payload type and producer-side input queue.
//!
//! ## Contents
//! - [`StreamEvent`] data-or-error payload broadcast to listeners
//! - [`Inlet`] bounded input queue between producers and the dispatcher
//!
//! See `controller/mod.rs` for the system-level wiring diagram.

mod event;
mod input;

pub use event::StreamEvent;
pub(crate) use input::Inlet;
