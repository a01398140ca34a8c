//! # Stream listener trait.
//!
//! Provides [`Listen`] an extension point for plugging async handlers into a stream.
//!
//! Each listener gets:
//! - **Dedicated delivery task** (runs independently of the producer)
//! - **Per-subscriber bounded queue** (capacity chosen by the [`Stream`](crate::Stream) view)
//! - **Panic isolation** (a panicking handler is logged and the next event is delivered)
//!
//! ## Architecture
//! ```text
//! dispatcher ──► [bounded queue] ──► delivery task ──► listener.on_data() / on_error()
//!                                                  └─► panic caught → tracing::warn!
//! ```
//!
//! ## Rules
//! - Events are processed sequentially (FIFO) per listener.
//! - A slow listener fills its own queue first; under the default blocking
//!   backpressure it then stalls the dispatcher until it drains or is cancelled.
//! - The default `on_error` drops the error silently.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use streamvisor::Listen;
//!
//! struct Totals {
//!     sum: AtomicU64,
//! }
//!
//! #[async_trait]
//! impl Listen<u64, String> for Totals {
//!     async fn on_data(&self, item: u64) {
//!         self.sum.fetch_add(item, Ordering::Relaxed);
//!     }
//!
//!     fn name(&self) -> &'static str { "totals" }
//! }
//! ```

use async_trait::async_trait;

/// Async handler for the events of one subscription.
///
/// ### Implementation requirements
/// - Return promptly; a handler that never returns stalls its queue and,
///   transitively, every subscriber after it in dispatch order.
/// - Handle errors internally; panics are caught but logged as faults.
#[async_trait]
pub trait Listen<T, E>: Send + Sync + 'static
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Processes a data item.
    async fn on_data(&self, item: T);

    /// Processes a producer-supplied error.
    ///
    /// Default: drop the error.
    async fn on_error(&self, _err: E) {}

    /// Returns the listener name used in log records.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
