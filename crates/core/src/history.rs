//! Transition history
//!
//! Fixed-capacity record of the most recent transitions, kept for audit
//! (e.g. telling a fatal shutdown apart from a storage power-down after the
//! fact). Uses heapless `HistoryBuf`, so no allocation; the oldest entry is
//! evicted when full and evictions are counted.

use heapless::HistoryBuf;

use crate::state::{PackState, Transition, Trigger};

/// Number of transitions retained
pub const TRANSITION_HISTORY_SIZE: usize = 16;

/// Ring buffer of applied transitions
pub struct TransitionLog {
    buffer: HistoryBuf<Transition, TRANSITION_HISTORY_SIZE>,
    overflow_count: u32,
}

impl TransitionLog {
    /// Empty log
    pub const fn new() -> Self {
        Self {
            buffer: HistoryBuf::new(),
            overflow_count: 0,
        }
    }

    /// Append a transition, evicting the oldest when full
    pub fn record(&mut self, transition: Transition) {
        if self.buffer.len() == TRANSITION_HISTORY_SIZE {
            self.overflow_count = self.overflow_count.saturating_add(1);
        }
        self.buffer.write(transition);
    }

    /// Most recent transition
    pub fn last(&self) -> Option<&Transition> {
        self.buffer.recent()
    }

    /// Most recent transition into `state`
    pub fn last_into(&self, state: PackState) -> Option<&Transition> {
        self.buffer
            .oldest_ordered()
            .filter(|t| t.to == state)
            .last()
    }

    /// Number of retained transitions fired by `trigger`
    pub fn count_trigger(&self, trigger: Trigger) -> usize {
        self.buffer
            .oldest_ordered()
            .filter(|t| t.trigger == trigger)
            .count()
    }

    /// Retained transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.oldest_ordered()
    }

    /// Number of retained transitions
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    /// Transitions evicted because the log was full
    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new()
    }
}
