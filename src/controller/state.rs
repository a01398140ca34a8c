use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a stream controller.
///
/// Transitions only move forward: `Open → Closing → Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    /// Accepting events and new subscribers.
    Open,
    /// Termination requested; emits are ignored and registrations fail.
    Closing,
    /// The dispatcher has exited and every delivery queue is closed.
    Closed,
}

impl ControllerState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerState::Open => "open",
            ControllerState::Closing => "closing",
            ControllerState::Closed => "closed",
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            ControllerState::Open => 0,
            ControllerState::Closing => 1,
            ControllerState::Closed => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            0 => ControllerState::Open,
            1 => ControllerState::Closing,
            _ => ControllerState::Closed,
        }
    }
}

/// Atomic cell holding a [`ControllerState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ControllerState::Open.as_u8()))
    }

    pub(crate) fn get(&self) -> ControllerState {
        ControllerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Open → Closing`. Returns `true` for the single caller that won the transition.
    pub(crate) fn begin_closing(&self) -> bool {
        self.0
            .compare_exchange(
                ControllerState::Open.as_u8(),
                ControllerState::Closing.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn mark_closed(&self) {
        self.0
            .store(ControllerState::Closed.as_u8(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_winner_for_closing() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), ControllerState::Open);
        assert!(cell.begin_closing());
        assert!(!cell.begin_closing());
        assert_eq!(cell.get(), ControllerState::Closing);

        cell.mark_closed();
        assert!(!cell.begin_closing());
        assert_eq!(cell.get(), ControllerState::Closed);
    }
}
