//! Parameter management types and utilities
//!
//! This module provides the parameter store and the pack controller's
//! parameter group. Loading values from the command line or a host file is
//! left to the caller.

pub mod error;
pub mod pack;
pub mod storage;

pub use error::ParameterError;
pub use pack::PackParams;
pub use storage::{ParamName, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, PARAM_NAME_LEN};
