//! Pack Parameter Definitions
//!
//! Tunables for the pack controller: classifier limits, soc thresholds and
//! per-tick step sizes.
//!
//! # Parameters
//!
//! | Name            | Default | Meaning                                         |
//! |-----------------|---------|-------------------------------------------------|
//! | `FLT_UV`        | 2.7     | Non-fatal undervoltage (V)                      |
//! | `FLT_OV`        | 4.0     | Non-fatal overvoltage (V)                       |
//! | `FLT_OC`        | 110     | Non-fatal overcurrent (A)                       |
//! | `FLT_TCOLD`     | 2.32    | Non-fatal cold limit, temp-proxy (V)            |
//! | `FLT_THOT`      | 1.55    | Non-fatal hot limit, temp-proxy (V)             |
//! | `FATAL_UV`      | 2.5     | Fatal undervoltage (V)                          |
//! | `FATAL_OV`      | 4.2     | Fatal overvoltage (V)                           |
//! | `FATAL_OC`      | 120     | Fatal overcurrent (A)                           |
//! | `FATAL_TCOLD`   | 2.35    | Fatal cold limit, temp-proxy (V)                |
//! | `FATAL_THOT`    | 1.51    | Fatal hot limit, temp-proxy (V)                 |
//! | `SOC_LOW`       | 4       | Drive cut-off charge (%)                        |
//! | `SOC_DRAIN`     | 0.5     | Charge consumed per driving tick (%)            |
//! | `FLT_LIMIT`     | 0.75    | Current scale while faulted                     |
//! | `STOR_SOC`      | 50      | Storage discharge target (%)                    |
//! | `STOR_STEP`     | 1       | Storage discharge per tick (%)                  |
//! | `CHG_STEP`      | 1       | Charge added per charging tick (%)              |
//! | `HOLD_MS`       | 5000    | Power button hold duration (ms)                 |
//! | `SLP_MAX_TICKS` | 1024    | Longest gap between sleep wake-ups (ticks)      |

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::fault::{FaultClassifier, FaultLimits};
use crate::inputs::DEFAULT_HOLD_MS;
use crate::sleep::DEFAULT_MAX_INTERVAL_TICKS;

/// Pack controller parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackParams {
    /// Current-limiting envelope
    pub non_fatal: FaultLimits,
    /// Shutdown envelope
    pub fatal: FaultLimits,
    /// Leave driving at or below this charge (%)
    pub soc_low: f64,
    /// Charge consumed per driving tick (%)
    pub drive_soc_drain: f64,
    /// Current scale applied while in fault operation, (0, 1]
    pub fault_limit_proportion: f64,
    /// Storage discharge target (%)
    pub storage_soc_target: f64,
    /// Storage discharge per tick (%)
    pub storage_step: f64,
    /// Charge added per charging tick (%)
    pub charge_step: f64,
    /// Power button hold duration (ms)
    pub hold_ms: u64,
    /// Longest gap between sleep wake-ups (ticks)
    pub sleep_max_interval_ticks: u64,
}

impl Default for PackParams {
    fn default() -> Self {
        Self {
            non_fatal: FaultLimits::NON_FATAL,
            fatal: FaultLimits::FATAL,
            soc_low: 4.0,
            drive_soc_drain: 0.5,
            fault_limit_proportion: 0.75,
            storage_soc_target: 50.0,
            storage_step: 1.0,
            charge_step: 1.0,
            hold_ms: DEFAULT_HOLD_MS,
            sleep_max_interval_ticks: DEFAULT_MAX_INTERVAL_TICKS,
        }
    }
}

impl PackParams {
    /// Register pack parameters with default values
    ///
    /// # Arguments
    ///
    /// * `store` - Parameter store to register parameters in
    ///
    /// # Returns
    ///
    /// Ok if all parameters registered successfully
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = Self::default();
        let float = |v: f64| ParamValue::Float(v);

        store.register("FLT_UV", float(d.non_fatal.undervoltage))?;
        store.register("FLT_OV", float(d.non_fatal.overvoltage))?;
        store.register("FLT_OC", float(d.non_fatal.overcurrent))?;
        store.register("FLT_TCOLD", float(d.non_fatal.temp_proxy_cold))?;
        store.register("FLT_THOT", float(d.non_fatal.temp_proxy_hot))?;

        store.register("FATAL_UV", float(d.fatal.undervoltage))?;
        store.register("FATAL_OV", float(d.fatal.overvoltage))?;
        store.register("FATAL_OC", float(d.fatal.overcurrent))?;
        store.register("FATAL_TCOLD", float(d.fatal.temp_proxy_cold))?;
        store.register("FATAL_THOT", float(d.fatal.temp_proxy_hot))?;

        store.register("SOC_LOW", float(d.soc_low))?;
        store.register("SOC_DRAIN", float(d.drive_soc_drain))?;
        store.register("FLT_LIMIT", float(d.fault_limit_proportion))?;
        store.register("STOR_SOC", float(d.storage_soc_target))?;
        store.register("STOR_STEP", float(d.storage_step))?;
        store.register("CHG_STEP", float(d.charge_step))?;

        store.register("HOLD_MS", ParamValue::Int(d.hold_ms as i32))?;
        store.register("SLP_MAX_TICKS", ParamValue::Int(d.sleep_max_interval_ticks as i32))?;

        Ok(())
    }

    /// Load pack parameters from parameter store
    ///
    /// Missing entries fall back to the defaults. The result is not
    /// validated; call [`PackParams::validate`] before use.
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = Self::default();
        let f = |name: &str, default: f64| store.get_f64_or(name, default);
        let ticks = |name: &str, default: u64| {
            let v = store.get_f64_or(name, default as f64);
            if v <= 0.0 {
                0
            } else {
                v as u64
            }
        };

        Self {
            non_fatal: FaultLimits {
                undervoltage: f("FLT_UV", d.non_fatal.undervoltage),
                overvoltage: f("FLT_OV", d.non_fatal.overvoltage),
                overcurrent: f("FLT_OC", d.non_fatal.overcurrent),
                temp_proxy_cold: f("FLT_TCOLD", d.non_fatal.temp_proxy_cold),
                temp_proxy_hot: f("FLT_THOT", d.non_fatal.temp_proxy_hot),
            },
            fatal: FaultLimits {
                undervoltage: f("FATAL_UV", d.fatal.undervoltage),
                overvoltage: f("FATAL_OV", d.fatal.overvoltage),
                overcurrent: f("FATAL_OC", d.fatal.overcurrent),
                temp_proxy_cold: f("FATAL_TCOLD", d.fatal.temp_proxy_cold),
                temp_proxy_hot: f("FATAL_THOT", d.fatal.temp_proxy_hot),
            },
            soc_low: f("SOC_LOW", d.soc_low),
            drive_soc_drain: f("SOC_DRAIN", d.drive_soc_drain),
            fault_limit_proportion: f("FLT_LIMIT", d.fault_limit_proportion),
            storage_soc_target: f("STOR_SOC", d.storage_soc_target),
            storage_step: f("STOR_STEP", d.storage_step),
            charge_step: f("CHG_STEP", d.charge_step),
            hold_ms: ticks("HOLD_MS", d.hold_ms),
            sleep_max_interval_ticks: ticks("SLP_MAX_TICKS", d.sleep_max_interval_ticks),
        }
    }

    /// Check the parameter set is usable
    ///
    /// Rejects fatal limits inside the non-fatal ones, empty envelopes,
    /// limit proportions outside (0, 1], non-positive steps and soc levels
    /// outside [0, 100].
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.classifier().is_none() {
            return Err(ParameterError::InconsistentLimits);
        }

        let in_soc_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_soc_range(self.soc_low) || !in_soc_range(self.storage_soc_target) {
            return Err(ParameterError::InvalidConfig);
        }

        if !(self.fault_limit_proportion > 0.0 && self.fault_limit_proportion <= 1.0) {
            return Err(ParameterError::InvalidConfig);
        }

        if !(self.drive_soc_drain > 0.0 && self.storage_step > 0.0 && self.charge_step > 0.0) {
            return Err(ParameterError::InvalidConfig);
        }

        Ok(())
    }

    /// Classifier built from the two limit sets, `None` if inconsistent
    pub fn classifier(&self) -> Option<FaultClassifier> {
        FaultClassifier::new(self.non_fatal, self.fatal)
    }
}
