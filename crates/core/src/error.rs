//! Controller error types

use core::fmt;

use crate::state::{PackState, Trigger};

/// Errors from transition requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The trigger has no edge out of the current state; state is unchanged
    InvalidTrigger {
        /// State the controller was (and still is) in
        state: PackState,
        /// Trigger that was requested
        trigger: Trigger,
    },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::InvalidTrigger { state, trigger } => {
                write!(f, "trigger '{}' is not valid in state '{}'", trigger, state)
            }
        }
    }
}

impl core::error::Error for TransitionError {}
