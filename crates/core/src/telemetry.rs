//! Telemetry snapshot and source abstraction
//!
//! The controller never measures anything itself. It asks a
//! [`TelemetrySource`] to advance and reads back the latest [`Telemetry`].
//! Firmware would back the trait with ADC sampling, the host simulator with a
//! randomized model, and tests with [`FixedSource`].

/// Typical cell voltage used as the self-test baseline (V)
pub const NOMINAL_VOLTAGE: f64 = 3.6;

/// Temperature sensor output at 25 °C (V)
pub const NOMINAL_TEMP_PROXY_VOLTAGE: f64 = 1.86;

/// Open-circuit voltage assumed before the first sample (V)
pub const NOMINAL_OCV: f64 = 3.8;

/// Full charge (%)
pub const SOC_FULL: f64 = 100.0;

/// Empty (%)
pub const SOC_EMPTY: f64 = 0.0;

/// Latest pack readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Terminal voltage (V)
    pub voltage: f64,
    /// Current magnitude (A)
    pub current: f64,
    /// Temperature sensor output (V), lower means hotter
    pub temp_proxy_voltage: f64,
    /// State of charge (%)
    pub soc: f64,
    /// Open-circuit voltage (V), refreshed only while sleeping
    pub ocv: f64,
}

impl Telemetry {
    /// Power-on readings: nominal voltage and temperature, no load, full charge
    pub const fn nominal() -> Self {
        Self {
            voltage: NOMINAL_VOLTAGE,
            current: 0.0,
            temp_proxy_voltage: NOMINAL_TEMP_PROXY_VOLTAGE,
            soc: SOC_FULL,
            ocv: NOMINAL_OCV,
        }
    }

    /// Overwrite the electrical readings with the self-test baseline
    ///
    /// State of charge and OCV are left alone.
    pub fn apply_self_test_baseline(&mut self) {
        self.voltage = NOMINAL_VOLTAGE;
        self.current = 0.0;
        self.temp_proxy_voltage = NOMINAL_TEMP_PROXY_VOLTAGE;
    }

    /// Clamp voltage, current and temperature proxy to be non-negative
    pub fn clamp_non_negative(&mut self) {
        self.voltage = self.voltage.max(0.0);
        self.current = self.current.max(0.0);
        self.temp_proxy_voltage = self.temp_proxy_voltage.max(0.0);
    }

    /// Clamp state of charge into [0, 100]
    pub fn clamp_soc(&mut self) {
        self.soc = self.soc.clamp(SOC_EMPTY, SOC_FULL);
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::nominal()
    }
}

/// Producer of pack readings
///
/// Implementors own the [`Telemetry`] record. The controller mutates it only
/// through these methods (plus direct writes for rail switching on state
/// entry) and only during its own tick.
pub trait TelemetrySource {
    /// Latest readings
    fn telemetry(&self) -> &Telemetry;

    /// Mutable access for state-entry side effects (rails off, load removed)
    fn telemetry_mut(&mut self) -> &mut Telemetry;

    /// Move the readings one step under load
    ///
    /// With the pedal pressed current and voltage rise and the cells heat
    /// (temperature proxy falls); the rise is scaled by `limit_proportion`.
    /// Released, everything relaxes back unscaled. Voltage, current and the
    /// temperature proxy must end non-negative.
    fn advance(&mut self, pedal_pressed: bool, limit_proportion: f64);

    /// Consume `step` percent of charge, never going below empty
    fn drain_soc(&mut self, step: f64) {
        let t = self.telemetry_mut();
        t.soc -= step;
        t.clamp_soc();
    }

    /// Refresh the open-circuit voltage
    ///
    /// With no load current the terminal voltage is the OCV.
    fn sample_ocv(&mut self) {
        let t = self.telemetry_mut();
        t.ocv = t.voltage;
    }
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for &mut T {
    fn telemetry(&self) -> &Telemetry {
        (**self).telemetry()
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        (**self).telemetry_mut()
    }

    fn advance(&mut self, pedal_pressed: bool, limit_proportion: f64) {
        (**self).advance(pedal_pressed, limit_proportion)
    }

    fn drain_soc(&mut self, step: f64) {
        (**self).drain_soc(step)
    }

    fn sample_ocv(&mut self) {
        (**self).sample_ocv()
    }
}

// ============================================================================
// Fixed Implementation (always available for testing)
// ============================================================================

/// Telemetry source whose readings only change when written
///
/// `advance` is a no-op apart from counting calls, which makes controller
/// behaviour fully deterministic: tests inject readings through
/// [`FixedSource::set`] or `telemetry_mut`.
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    telemetry: Telemetry,
    advance_calls: u32,
    last_limit_proportion: Option<f64>,
}

impl FixedSource {
    /// Source starting at the power-on readings
    pub fn new() -> Self {
        Self::default()
    }

    /// Source starting at the given readings
    pub fn with_telemetry(telemetry: Telemetry) -> Self {
        Self {
            telemetry,
            ..Self::default()
        }
    }

    /// Replace all readings
    pub fn set(&mut self, telemetry: Telemetry) {
        self.telemetry = telemetry;
    }

    /// Number of `advance` calls so far
    pub fn advance_calls(&self) -> u32 {
        self.advance_calls
    }

    /// Limit proportion passed to the most recent `advance`
    pub fn last_limit_proportion(&self) -> Option<f64> {
        self.last_limit_proportion
    }
}

impl TelemetrySource for FixedSource {
    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }

    fn advance(&mut self, _pedal_pressed: bool, limit_proportion: f64) {
        self.advance_calls = self.advance_calls.saturating_add(1);
        self.last_limit_proportion = Some(limit_proportion);
        self.telemetry.clamp_non_negative();
    }
}
