//! pack_bms_core - Pure no_std logic for the battery pack supervisor
//!
//! This crate contains the platform-agnostic pieces of the pack controller
//! and can be tested on host without any feature flags.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Telemetry and time injected via traits
//!
//! # Modules
//!
//! - [`state`]: Pack states, triggers and the transition table
//! - [`telemetry`]: Telemetry snapshot and the `TelemetrySource` trait
//! - [`fault`]: Non-fatal and fatal fault classification
//! - [`inputs`]: Operator/charger inputs and power button hold detection
//! - [`sleep`]: Doubling wake-up schedule used while sleeping
//! - [`history`]: Fixed-size transition log
//! - [`parameters`]: Parameter store and pack parameter group
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)
//! - [`error`]: Transition errors

#![no_std]

pub mod error;
pub mod fault;
pub mod history;
pub mod inputs;
pub mod parameters;
pub mod sleep;
pub mod state;
pub mod telemetry;
pub mod traits;

pub use error::TransitionError;
pub use fault::{is_fatal_fault, is_non_fatal_fault, FaultClassifier, FaultFlags, FaultReport};
pub use state::{next_state, PackState, Transition, Trigger};
pub use telemetry::{Telemetry, TelemetrySource};
