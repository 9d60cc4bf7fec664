//! Fault classifiers
//!
//! Two independent threshold sets are evaluated against a telemetry snapshot:
//! - **Non-fatal**: pack is outside its comfortable envelope, limit current
//!   and keep monitoring
//! - **Fatal**: pack is outside its safe envelope, shut down immediately
//!
//! Both are pure functions of the snapshot and are recomputed every tick.
//! The fatal limits always sit at or beyond the non-fatal ones, so a fatal
//! snapshot is also a non-fatal one.

use bitflags::bitflags;

use crate::telemetry::Telemetry;

bitflags! {
    /// Limits tripped by a telemetry snapshot
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FaultFlags: u8 {
        /// Voltage at or below the undervoltage limit
        const UNDERVOLTAGE = 0b0000_0001;
        /// Voltage at or above the overvoltage limit
        const OVERVOLTAGE = 0b0000_0010;
        /// Current at or above the overcurrent limit
        const OVERCURRENT = 0b0000_0100;
        /// Temperature proxy at or above the cold limit
        const UNDERTEMP = 0b0000_1000;
        /// Temperature proxy at or below the hot limit
        const OVERTEMP = 0b0001_0000;
    }
}

impl FaultFlags {
    /// Name of the most significant tripped limit, for log lines
    pub fn primary_name(self) -> &'static str {
        if self.contains(FaultFlags::OVERCURRENT) {
            "overcurrent"
        } else if self.contains(FaultFlags::OVERVOLTAGE) {
            "overvoltage"
        } else if self.contains(FaultFlags::UNDERVOLTAGE) {
            "undervoltage"
        } else if self.contains(FaultFlags::OVERTEMP) {
            "overtemperature"
        } else if self.contains(FaultFlags::UNDERTEMP) {
            "undertemperature"
        } else {
            "none"
        }
    }
}

/// One set of classifier thresholds
///
/// Temperature is measured through a sensor whose output voltage falls as
/// the cells heat up, so the cold limit is the *upper* voltage bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultLimits {
    /// Trip at or below this voltage (V)
    pub undervoltage: f64,
    /// Trip at or above this voltage (V)
    pub overvoltage: f64,
    /// Trip at or above this current (A)
    pub overcurrent: f64,
    /// Trip at or above this temperature proxy voltage (V), too cold
    pub temp_proxy_cold: f64,
    /// Trip at or below this temperature proxy voltage (V), too hot
    pub temp_proxy_hot: f64,
}

impl FaultLimits {
    /// Discharge envelope that triggers current limiting
    ///
    /// 2.7 V < V < 4.0 V, I < 110 A, -15 °C < T < 55 °C.
    pub const NON_FATAL: FaultLimits = FaultLimits {
        undervoltage: 2.7,
        overvoltage: 4.0,
        overcurrent: 110.0,
        temp_proxy_cold: 2.32,
        temp_proxy_hot: 1.55,
    };

    /// Cell datasheet envelope; outside it the pack is shut off
    ///
    /// 2.5 V < V < 4.2 V, I < 120 A, -20 °C < T < 60 °C.
    pub const FATAL: FaultLimits = FaultLimits {
        undervoltage: 2.5,
        overvoltage: 4.2,
        overcurrent: 120.0,
        temp_proxy_cold: 2.35,
        temp_proxy_hot: 1.51,
    };

    /// Evaluate a snapshot against these limits
    ///
    /// At most one temperature flag is raised; cold is checked first.
    pub fn evaluate(&self, t: &Telemetry) -> FaultFlags {
        let mut flags = FaultFlags::empty();

        if t.voltage <= self.undervoltage {
            flags |= FaultFlags::UNDERVOLTAGE;
        }
        if t.voltage >= self.overvoltage {
            flags |= FaultFlags::OVERVOLTAGE;
        }
        if t.current >= self.overcurrent {
            flags |= FaultFlags::OVERCURRENT;
        }
        if t.temp_proxy_voltage >= self.temp_proxy_cold {
            flags |= FaultFlags::UNDERTEMP;
        } else if t.temp_proxy_voltage <= self.temp_proxy_hot {
            flags |= FaultFlags::OVERTEMP;
        }

        flags
    }

    /// True when every limit of `inner` is at or inside the matching limit
    /// of `self` (i.e. `self` is the wider, more severe envelope)
    pub fn encloses(&self, inner: &FaultLimits) -> bool {
        self.undervoltage <= inner.undervoltage
            && self.overvoltage >= inner.overvoltage
            && self.overcurrent >= inner.overcurrent
            && self.temp_proxy_cold >= inner.temp_proxy_cold
            && self.temp_proxy_hot <= inner.temp_proxy_hot
    }

    /// True when the bounds describe a non-empty envelope
    pub fn is_ordered(&self) -> bool {
        self.undervoltage < self.overvoltage
            && self.temp_proxy_hot < self.temp_proxy_cold
            && self.overcurrent > 0.0
    }
}

/// Result of running both classifiers on one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultReport {
    /// Limits tripped against the non-fatal set
    pub non_fatal: FaultFlags,
    /// Limits tripped against the fatal set
    pub fatal: FaultFlags,
}

impl FaultReport {
    /// Any non-fatal limit tripped
    pub fn is_non_fatal(&self) -> bool {
        !self.non_fatal.is_empty()
    }

    /// Any fatal limit tripped
    pub fn is_fatal(&self) -> bool {
        !self.fatal.is_empty()
    }

    /// Neither classifier tripped
    pub fn is_clear(&self) -> bool {
        !self.is_non_fatal() && !self.is_fatal()
    }
}

/// Pair of threshold sets used by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultClassifier {
    /// Current-limiting envelope
    pub non_fatal: FaultLimits,
    /// Shutdown envelope
    pub fatal: FaultLimits,
}

impl FaultClassifier {
    /// Build a classifier; `None` if the fatal set sits inside the non-fatal set
    pub fn new(non_fatal: FaultLimits, fatal: FaultLimits) -> Option<Self> {
        if fatal.encloses(&non_fatal) && non_fatal.is_ordered() {
            Some(Self { non_fatal, fatal })
        } else {
            None
        }
    }

    /// Run both classifiers
    pub fn classify(&self, t: &Telemetry) -> FaultReport {
        FaultReport {
            non_fatal: self.non_fatal.evaluate(t),
            fatal: self.fatal.evaluate(t),
        }
    }
}

impl Default for FaultClassifier {
    fn default() -> Self {
        Self {
            non_fatal: FaultLimits::NON_FATAL,
            fatal: FaultLimits::FATAL,
        }
    }
}

/// Non-fatal classifier with the default limits
pub fn is_non_fatal_fault(t: &Telemetry) -> bool {
    !FaultLimits::NON_FATAL.evaluate(t).is_empty()
}

/// Fatal classifier with the default limits
pub fn is_fatal_fault(t: &Telemetry) -> bool {
    !FaultLimits::FATAL.evaluate(t).is_empty()
}
