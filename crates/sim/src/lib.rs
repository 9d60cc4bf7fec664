//! Host-side simulation for the pack controller.
//!
//! A randomized [`SimulatedPack`] telemetry source, an operator [`Harness`]
//! that plays the pedal, power button and charger, and scripted
//! [`Scenario`] walkthroughs built on both.

pub mod error;
pub mod harness;
pub mod params;
pub mod scenario;
pub mod source;

pub use error::SimError;
pub use harness::{Harness, HarnessConfig};
pub use params::{default_store, load_params};
pub use scenario::{Scenario, ScenarioReport};
pub use source::{SimConfig, SimulatedPack, Span};
