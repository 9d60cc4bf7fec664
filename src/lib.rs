#![cfg_attr(not(test), no_std)]

//! pack_bms - Supervisory controller for a single-chemistry battery pack
//!
//! The platform-agnostic state machine pieces live in `pack_bms_core`; this
//! crate wires them into the tick-driven [`PackController`] and provides the
//! logging macros used by the controller.
//!
//! [`PackController`]: subsystems::pack_controller::PackController

// Logging macros (log_info!, log_warn!, ...)
pub mod logging;

// Pack supervisory state machine
pub mod subsystems;
