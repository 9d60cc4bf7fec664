//! Controller subsystems
//!
//! - [`pack_controller`]: tick-driven pack supervisory state machine

pub mod pack_controller;

pub use pack_controller::{PackController, TickOutcome};
