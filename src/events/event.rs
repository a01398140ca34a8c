//! # Events carried through a stream.
//!
//! A [`StreamEvent`] is either a data item or a producer-supplied error. Both
//! travel the same path (input queue → dispatcher → delivery queue) and keep
//! their relative order; only the listener decides which callback runs.
//!
//! ## Example
//! ```rust
//! use streamvisor::StreamEvent;
//!
//! let ev: StreamEvent<u32, String> = StreamEvent::Data(10);
//! assert!(ev.is_data());
//! assert_eq!(ev.data(), Some(&10));
//!
//! let ev: StreamEvent<u32, String> = Err("boom".to_string()).into();
//! assert_eq!(ev.error().map(String::as_str), Some("boom"));
//! ```

use crate::error::SharedError;

/// A single item emitted by a stream producer.
///
/// Immutable once constructed. The dispatcher clones it once per receiving subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T, E = SharedError> {
    /// A data item, routed to `on_data`.
    Data(T),
    /// A producer-supplied error, routed to `on_error` (dropped when no handler is set).
    Error(E),
}

impl<T, E> StreamEvent<T, E> {
    /// Returns `true` for [`StreamEvent::Data`].
    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self, StreamEvent::Data(_))
    }

    /// Returns `true` for [`StreamEvent::Error`].
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, StreamEvent::Error(_))
    }

    /// Borrows the data payload, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            StreamEvent::Data(v) => Some(v),
            StreamEvent::Error(_) => None,
        }
    }

    /// Borrows the error payload, if any.
    pub fn error(&self) -> Option<&E> {
        match self {
            StreamEvent::Data(_) => None,
            StreamEvent::Error(e) => Some(e),
        }
    }

    /// Converts the event into a `Result`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            StreamEvent::Data(v) => Ok(v),
            StreamEvent::Error(e) => Err(e),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamEvent::Data(_) => "data",
            StreamEvent::Error(_) => "error",
        }
    }
}

impl<T, E> From<Result<T, E>> for StreamEvent<T, E> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(v) => StreamEvent::Data(v),
            Err(e) => StreamEvent::Error(e),
        }
    }
}
