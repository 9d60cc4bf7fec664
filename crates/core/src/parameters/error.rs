//! Parameter error types
//!
//! Provides error types for parameter store operations and validation.

/// Errors from parameter store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// Parameter value or name outside what the pack accepts
    InvalidConfig,
    /// Store is full
    StoreFull,
    /// No parameter registered under that name
    UnknownName,
    /// Value type does not match the registered type
    TypeMismatch,
    /// A fatal limit sits inside its non-fatal counterpart
    InconsistentLimits,
}

impl core::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParameterError::InvalidConfig => write!(f, "invalid parameter configuration"),
            ParameterError::StoreFull => write!(f, "parameter store full"),
            ParameterError::UnknownName => write!(f, "no such parameter"),
            ParameterError::TypeMismatch => write!(f, "parameter value has the wrong type"),
            ParameterError::InconsistentLimits => {
                write!(f, "fatal fault limits must enclose the non-fatal limits")
            }
        }
    }
}

impl core::error::Error for ParameterError {}
