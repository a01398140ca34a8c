//! Delivery policies.
//!
//! ## Contents
//! - [`BackpressurePolicy`] what the dispatcher does with a full delivery queue
//!
//! ## Quick wiring
//! ```text
//! ControllerConfig { backpressure: BackpressurePolicy, .. }
//!      └─► controller::dispatcher passes it to every Target::deliver()
//! ```
//!
//! ## Defaults
//! - `BackpressurePolicy::Block` (lossless; cancellation is the escape hatch).

mod backpressure;

pub use backpressure::BackpressurePolicy;
