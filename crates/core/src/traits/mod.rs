//! Platform-agnostic traits for the pack controller.
//!
//! Trait definitions carry no feature gates; mock implementations are always
//! available so timing-dependent logic can be tested on the host.

pub mod time;

pub use time::{MockTime, TimeSource};
