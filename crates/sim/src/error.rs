use pack_bms_core::error::TransitionError;
use pack_bms_core::parameters::ParameterError;
use pack_bms_core::state::PackState;

/// Errors raised while driving the simulated pack.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Expected state {expected}, found {actual}")]
    UnexpectedState {
        expected: PackState,
        actual: PackState,
    },

    #[error("Timeout waiting for {what} after {ticks} ticks")]
    Timeout { what: &'static str, ticks: u64 },

    #[error("Invalid trigger: {0}")]
    InvalidTrigger(#[from] TransitionError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Check failed: {0}")]
    CheckFailed(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Cannot override {name}: {source}")]
    Override {
        name: String,
        source: ParameterError,
    },

    #[error("Malformed parameter override '{0}', expected NAME=VALUE")]
    BadParam(String),
}
