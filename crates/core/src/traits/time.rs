//! Time abstraction for input timing.
//!
//! The controller itself counts ticks and never reads a clock. Anything that
//! needs wall-clock duration (power button hold detection) takes a
//! [`TimeSource`] so firmware can plug in its monotonic timer and tests can
//! use [`MockTime`].

use core::cell::Cell;

/// Monotonic millisecond clock.
///
/// # Example
///
/// ```
/// use pack_bms_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// let pressed_at = time.now_ms();
/// time.advance_ms(5_000);
/// assert_eq!(time.elapsed_since(pressed_at), 5_000);
/// ```
pub trait TimeSource {
    /// Milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `reference_ms`, saturating at zero.
    fn elapsed_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Manually advanced clock.
///
/// Interior mutability lets a harness advance time through a shared
/// reference while detectors hold `&MockTime`.
#[derive(Debug, Clone, Default)]
pub struct MockTime {
    current_ms: Cell<u64>,
}

impl MockTime {
    /// Clock starting at 0.
    pub fn new() -> Self {
        Self {
            current_ms: Cell::new(0),
        }
    }

    /// Clock starting at `ms`.
    pub fn with_initial(ms: u64) -> Self {
        Self {
            current_ms: Cell::new(ms),
        }
    }

    /// Set the absolute time.
    pub fn set(&self, ms: u64) {
        self.current_ms.set(ms);
    }

    /// Move time forward by `ms`.
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.set(self.current_ms.get().saturating_add(ms));
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_ms.get()
    }
}
