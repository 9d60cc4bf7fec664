//! Scripted walkthroughs.
//!
//! Each scenario powers the pack on from `DeepSleep`, drives it through a
//! path of the state machine with the harness, and checks the states it
//! passes through. The telemetry is random, so the checks only rely on what
//! the random walk guarantees (direction and bounded step size).

use core::fmt;
use core::str::FromStr;

use pack_bms_core::state::{PackState, Transition, Trigger};
use pack_bms_core::telemetry::{Telemetry, TelemetrySource, SOC_FULL};

use crate::error::SimError;
use crate::harness::Harness;

/// Ticks spent pressing, then releasing, the pedal on a short drive
const DRIVE_TICKS: u64 = 10;

/// Ticks a docked, full pack is watched for stray charging
const DOCKED_TICKS: u64 = 20;

const SOC_EPS: f64 = 1e-9;

/// Available walkthroughs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// deep_sleep -> run_tests -> deep_sleep (diagnostics fail)
    SelfTestFailure,
    /// ... -> idle -> normal_operation -> sleep
    DriveAndSleep,
    /// ... -> normal_operation -> fault_operating -> deep_sleep (fatal)
    FaultEscalation,
    /// ... -> sleep -> discharge_to_storage -> deep_sleep at storage charge
    StorageDischarge,
    /// ... -> sleep -> charging -> sleep at full charge
    ChargeCycle,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::SelfTestFailure,
        Scenario::DriveAndSleep,
        Scenario::FaultEscalation,
        Scenario::StorageDischarge,
        Scenario::ChargeCycle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::SelfTestFailure => "self-test-failure",
            Scenario::DriveAndSleep => "drive-and-sleep",
            Scenario::FaultEscalation => "fault-escalation",
            Scenario::StorageDischarge => "storage-discharge",
            Scenario::ChargeCycle => "charge-cycle",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::SelfTestFailure => "power on with failing diagnostics, back to deep sleep",
            Scenario::DriveAndSleep => "power on, drive, coast, then sleep on the button",
            Scenario::FaultEscalation => {
                "hold the pedal until a fault, keep going until fatal shutdown"
            }
            Scenario::StorageDischarge => {
                "drive, sleep, hold the button and discharge to storage charge"
            }
            Scenario::ChargeCycle => "drive, sleep, plug in the charger and fill to 100 %",
        }
    }

    /// Run the scenario on a harness whose controller is still in `DeepSleep`.
    pub fn run<S: TelemetrySource>(
        self,
        harness: &mut Harness<S>,
    ) -> Result<ScenarioReport, SimError> {
        match self {
            Scenario::SelfTestFailure => self_test_failure(harness)?,
            Scenario::DriveAndSleep => drive_and_sleep(harness)?,
            Scenario::FaultEscalation => fault_escalation(harness)?,
            Scenario::StorageDischarge => storage_discharge(harness)?,
            Scenario::ChargeCycle => charge_cycle(harness)?,
        }

        Ok(ScenarioReport {
            scenario: self,
            ticks: harness.controller().tick_count(),
            elapsed_ms: harness.now_ms(),
            transitions: harness.transitions().to_vec(),
            final_state: harness.state(),
            telemetry: *harness.telemetry(),
            fatal_shutdown: harness.controller().is_fatal_shutdown(),
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| SimError::UnknownScenario(s.to_string()))
    }
}

/// Outcome of a completed scenario.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// Controller ticks run.
    pub ticks: u64,
    /// Simulated time elapsed (ms).
    pub elapsed_ms: u64,
    /// Every transition, oldest first.
    pub transitions: Vec<Transition>,
    pub final_state: PackState,
    pub telemetry: Telemetry,
    /// Final `DeepSleep` was caused by the fatal classifier.
    pub fatal_shutdown: bool,
}

impl ScenarioReport {
    /// Number of transitions fired by `trigger`.
    pub fn count(&self, trigger: Trigger) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.trigger == trigger)
            .count()
    }
}

fn self_test_failure<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    let settled = h.power_on(false)?;
    if settled != PackState::DeepSleep {
        return Err(SimError::UnexpectedState {
            expected: PackState::DeepSleep,
            actual: settled,
        });
    }
    if h.controller().is_fatal_shutdown() {
        return Err(SimError::CheckFailed(
            "self-test failure reported as fatal shutdown".to_string(),
        ));
    }
    Ok(())
}

/// Power on, press the pedal and drive/coast for a while.
fn start_driving<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    let settled = h.power_on(true)?;
    if settled != PackState::Idle {
        return Err(SimError::UnexpectedState {
            expected: PackState::Idle,
            actual: settled,
        });
    }

    h.set_pedal(true);
    h.step();
    h.expect_state(PackState::NormalOperation)?;
    Ok(())
}

/// Drive, coast, then press the button until the pack sleeps.
fn drive_to_sleep<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    start_driving(h)?;

    h.run_for(DRIVE_TICKS);
    expect_driving(h)?;

    h.set_pedal(false);
    h.run_for(DRIVE_TICKS);
    expect_driving(h)?;

    h.press_button();
    h.run_until(PackState::Sleep)?;
    Ok(())
}

/// A short drive may trip a non-fatal limit but never leaves the road.
fn expect_driving<S: TelemetrySource>(h: &Harness<S>) -> Result<(), SimError> {
    let state = h.state();
    if state.is_driving() {
        Ok(())
    } else {
        Err(SimError::UnexpectedState {
            expected: PackState::NormalOperation,
            actual: state,
        })
    }
}

fn drive_and_sleep<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    drive_to_sleep(h)?;

    let current = h.telemetry().current;
    if current != 0.0 {
        return Err(SimError::CheckFailed(format!(
            "sleeping with {current} A flowing"
        )));
    }
    Ok(())
}

fn fault_escalation<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    start_driving(h)?;

    // pedal stays down: current, voltage and heat only ever increase
    h.run_until(PackState::FaultOperating)?;
    h.run_until(PackState::DeepSleep)?;

    if !h.controller().is_fatal_shutdown() {
        let cause = h.controller().last_transition().map(|t| t.trigger.name());
        return Err(SimError::CheckFailed(format!(
            "deep sleep reached via {cause:?}, expected fatal_fault"
        )));
    }
    Ok(())
}

fn storage_discharge<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    drive_to_sleep(h)?;

    h.hold_button()?;
    h.run_until(PackState::DischargeToStorage)?;
    h.run_until(PackState::DeepSleep)?;

    let soc = h.telemetry().soc;
    let target = h.controller().params().storage_soc_target;
    if (soc - target).abs() > SOC_EPS {
        return Err(SimError::CheckFailed(format!(
            "stored at {soc} %, expected {target} %"
        )));
    }
    Ok(())
}

fn charge_cycle<S: TelemetrySource>(h: &mut Harness<S>) -> Result<(), SimError> {
    drive_to_sleep(h)?;

    h.set_charger(true);
    h.run_until(PackState::Charging)?;
    h.run_until(PackState::Sleep)?;

    let soc = h.telemetry().soc;
    if (soc - SOC_FULL).abs() > SOC_EPS {
        return Err(SimError::CheckFailed(format!(
            "charging stopped at {soc} %"
        )));
    }

    // charger still connected to a full pack: stay asleep
    h.run_for(DOCKED_TICKS);
    h.expect_state(PackState::Sleep)?;
    h.set_charger(false);
    Ok(())
}
