//! Randomized pack telemetry.
//!
//! Each `advance` nudges current, voltage and the temperature proxy by a
//! bounded uniform random amount. Pressing the pedal loads the pack (current
//! and voltage up, cells heat so the proxy falls) scaled by the limit
//! proportion; releasing it lets everything relax, unscaled. A seed makes a
//! run reproducible.

use pack_bms_core::telemetry::{Telemetry, TelemetrySource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Closed-open range a random delta is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw a value; a degenerate span always yields `min`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Configuration for the simulated pack.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
    /// Readings at power-on.
    pub initial: Telemetry,
    /// Current rise per loaded step (A).
    pub drive_current: Span,
    /// Voltage rise per loaded step (V).
    pub drive_voltage: Span,
    /// Temperature proxy fall per loaded step (V).
    pub drive_heating: Span,
    /// Current fall per coasting step (A).
    pub coast_current: Span,
    /// Voltage fall per coasting step (V).
    pub coast_voltage: Span,
    /// Temperature proxy rise per coasting step (V).
    pub coast_cooling: Span,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            initial: Telemetry::nominal(),
            drive_current: Span::new(0.5, 5.0),
            drive_voltage: Span::new(0.01, 0.05),
            drive_heating: Span::new(0.01, 0.02),
            coast_current: Span::new(0.5, 2.0),
            coast_voltage: Span::new(0.01, 0.05),
            coast_cooling: Span::new(0.01, 0.02),
        }
    }
}

impl SimConfig {
    /// Default configuration with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Telemetry source backed by a random walk.
pub struct SimulatedPack {
    config: SimConfig,
    telemetry: Telemetry,
    rng: StdRng,
    steps: u64,
}

impl SimulatedPack {
    /// Create a simulated pack with the given configuration.
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            telemetry: config.initial,
            config,
            rng,
            steps: 0,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SimConfig::default())
    }

    /// Return to the initial readings and reseed.
    pub fn reset(&mut self) {
        self.telemetry = self.config.initial;
        self.rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.steps = 0;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of `advance` calls since creation or reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl TelemetrySource for SimulatedPack {
    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }

    fn advance(&mut self, pedal_pressed: bool, limit_proportion: f64) {
        let c = &self.config;
        let t = &mut self.telemetry;

        if pedal_pressed {
            t.current += c.drive_current.sample(&mut self.rng) * limit_proportion;
            t.voltage += c.drive_voltage.sample(&mut self.rng) * limit_proportion;
            t.temp_proxy_voltage -= c.drive_heating.sample(&mut self.rng) * limit_proportion;
        } else {
            // coasting is not current-limited
            t.current -= c.coast_current.sample(&mut self.rng);
            t.voltage -= c.coast_voltage.sample(&mut self.rng);
            t.temp_proxy_voltage += c.coast_cooling.sample(&mut self.rng);
        }

        t.clamp_non_negative();
        self.steps += 1;
    }
}
