//! Operator harness.
//!
//! Plays the environment around a [`PackController`]: advances simulated
//! time by a fixed step per tick, turns the power button level into press
//! and hold events, and flips the pedal, charger and diagnostics inputs.
//! Every transition is kept (the controller itself only retains the most
//! recent ones).

use pack_bms::subsystems::{PackController, TickOutcome};
use pack_bms_core::inputs::{ButtonEvent, HoldDetector};
use pack_bms_core::parameters::PackParams;
use pack_bms_core::state::{PackState, Transition, Trigger};
use pack_bms_core::telemetry::{Telemetry, TelemetrySource};
use pack_bms_core::traits::{MockTime, TimeSource};

use crate::error::SimError;
use crate::source::SimulatedPack;

/// Harness timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Simulated time per controller tick (ms).
    pub tick_ms: u64,
    /// Upper bound on ticks for any single wait.
    pub max_ticks: u64,
}

impl HarnessConfig {
    /// Simulated time at the end of controller tick `tick` (s).
    pub fn seconds_at(&self, tick: u64) -> f64 {
        tick.saturating_mul(self.tick_ms) as f64 / 1000.0
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            max_ticks: 20_000,
        }
    }
}

/// Environment driving a simulated pack controller.
pub struct Harness<S: TelemetrySource = SimulatedPack> {
    controller: PackController<S>,
    time: MockTime,
    button: HoldDetector,
    button_down: bool,
    last_button_event: Option<ButtonEvent>,
    config: HarnessConfig,
    transitions: Vec<Transition>,
}

impl<S: TelemetrySource> Harness<S> {
    /// Build a harness around a new controller.
    pub fn new(source: S, params: PackParams, config: HarnessConfig) -> Result<Self, SimError> {
        let controller = PackController::new(source, params)?;
        Ok(Self {
            controller,
            time: MockTime::new(),
            button: HoldDetector::new(params.hold_ms),
            button_down: false,
            last_button_event: None,
            config,
            transitions: Vec::new(),
        })
    }

    pub fn controller(&self) -> &PackController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PackController<S> {
        &mut self.controller
    }

    pub fn state(&self) -> PackState {
        self.controller.state()
    }

    pub fn telemetry(&self) -> &Telemetry {
        self.controller.telemetry()
    }

    /// Direct access to the readings, for fault injection.
    pub fn telemetry_mut(&mut self) -> &mut Telemetry {
        self.controller.source_mut().telemetry_mut()
    }

    /// Simulated time since the harness started (ms).
    pub fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Every transition applied so far, oldest first.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn set_pedal(&mut self, pressed: bool) {
        self.controller.inputs_mut().pedal_pressed = pressed;
    }

    pub fn set_charger(&mut self, present: bool) {
        self.controller.inputs_mut().charger_present = present;
    }

    pub fn set_diagnostics(&mut self, pass: bool) {
        self.controller.inputs_mut().diagnostics_pass = pass;
    }

    /// Advance time by one tick, sample the button and tick the controller.
    pub fn step(&mut self) -> TickOutcome {
        self.time.advance_ms(self.config.tick_ms);

        self.last_button_event = self.button.update(self.button_down, &self.time);
        if let Some(event) = self.last_button_event {
            self.controller.inputs_mut().latch(event);
        }

        let outcome = self.controller.tick();
        if let Some(transition) = outcome.transition {
            self.transitions.push(transition);
        }
        outcome
    }

    /// Run `ticks` steps regardless of what happens.
    pub fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until the controller reaches `target`.
    ///
    /// Returns the number of steps taken (0 if already there).
    pub fn run_until(&mut self, target: PackState) -> Result<u64, SimError> {
        let mut ticks = 0;
        while self.controller.state() != target {
            if ticks >= self.config.max_ticks {
                return Err(SimError::Timeout {
                    what: target.name(),
                    ticks,
                });
            }
            self.step();
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Short press: one tick down, released on the next.
    ///
    /// The press is latched on the release tick; states that only look at
    /// inputs on wake-up may act on it later.
    pub fn press_button(&mut self) -> TickOutcome {
        self.button_down = true;
        self.step();
        self.button_down = false;
        self.step()
    }

    /// Keep the button down until the hold is reported, then let go.
    pub fn hold_button(&mut self) -> Result<TickOutcome, SimError> {
        self.button_down = true;
        let mut ticks = 0;
        let result = loop {
            if ticks >= self.config.max_ticks {
                break Err(SimError::Timeout {
                    what: "button hold",
                    ticks,
                });
            }
            let outcome = self.step();
            ticks += 1;
            if self.last_button_event == Some(ButtonEvent::Hold) {
                break Ok(outcome);
            }
        };
        self.button_down = false;
        result
    }

    /// Hold the power button and run the self-test.
    ///
    /// Returns the state the self-test settled in (`Idle` or `DeepSleep`).
    pub fn power_on(&mut self, diagnostics_pass: bool) -> Result<PackState, SimError> {
        self.expect_state(PackState::DeepSleep)?;
        self.set_diagnostics(diagnostics_pass);

        self.hold_button()?;
        self.expect_state(PackState::RunTests)?;

        Ok(self.step().state)
    }

    /// Request a transition directly, bypassing the guards.
    pub fn fire(&mut self, trigger: Trigger) -> Result<Transition, SimError> {
        let transition = self.controller.fire(trigger)?;
        self.transitions.push(transition);
        Ok(transition)
    }

    pub fn expect_state(&self, expected: PackState) -> Result<(), SimError> {
        let actual = self.controller.state();
        if actual == expected {
            Ok(())
        } else {
            Err(SimError::UnexpectedState { expected, actual })
        }
    }
}

impl Harness<SimulatedPack> {
    /// Harness with default parameters and timing around a simulated pack.
    pub fn simulated(pack: SimulatedPack) -> Self {
        Self {
            controller: PackController::with_defaults(pack),
            time: MockTime::new(),
            button: HoldDetector::default(),
            button_down: false,
            last_button_event: None,
            config: HarnessConfig::default(),
            transitions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pack_bms_core::telemetry::FixedSource;

    fn fixed_harness() -> Harness<FixedSource> {
        Harness::new(
            FixedSource::new(),
            PackParams::default(),
            HarnessConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_seconds_at_saturates() {
        let config = HarnessConfig::default();
        assert!((config.seconds_at(25) - 2.5).abs() < 1e-12);

        let huge = HarnessConfig {
            tick_ms: u64::MAX / 2,
            ..HarnessConfig::default()
        };
        assert!((huge.seconds_at(3) - u64::MAX as f64 / 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_hold_takes_hold_duration() {
        let mut h = fixed_harness();
        let outcome = h.hold_button().unwrap();

        assert_eq!(outcome.state, PackState::RunTests);
        // pressed on the first step, hold reported 5 s later
        assert_eq!(h.now_ms(), 5_100);
        assert!(!h.controller().inputs().button_held_5s);
    }

    #[test]
    fn test_power_on_paths() {
        let mut ok = fixed_harness();
        assert_eq!(ok.power_on(true).unwrap(), PackState::Idle);

        let mut failed = fixed_harness();
        assert_eq!(failed.power_on(false).unwrap(), PackState::DeepSleep);
        assert_eq!(
            failed.transitions().last().map(|t| t.trigger),
            Some(Trigger::TestsFailed)
        );
    }

    #[test]
    fn test_power_on_requires_deep_sleep() {
        let mut h = fixed_harness();
        h.power_on(true).unwrap();
        assert!(matches!(
            h.power_on(true),
            Err(SimError::UnexpectedState {
                expected: PackState::DeepSleep,
                actual: PackState::Idle,
            })
        ));
    }

    #[test]
    fn test_press_button_is_not_a_hold() {
        let mut h = fixed_harness();
        h.power_on(true).unwrap();

        let outcome = h.press_button();
        assert_eq!(outcome.state, PackState::Sleep);
        assert_eq!(
            outcome.transition.map(|t| t.trigger),
            Some(Trigger::ButtonPressed)
        );
    }

    #[test]
    fn test_run_until_times_out() {
        let mut h = Harness::new(
            FixedSource::new(),
            PackParams::default(),
            HarnessConfig {
                tick_ms: 100,
                max_ticks: 10,
            },
        )
        .unwrap();

        assert!(matches!(
            h.run_until(PackState::Idle),
            Err(SimError::Timeout { ticks: 10, .. })
        ));
    }

    #[test]
    fn test_fire_records_and_reports_errors() {
        let mut h = fixed_harness();
        assert!(matches!(
            h.fire(Trigger::FullyCharged),
            Err(SimError::InvalidTrigger(_))
        ));

        h.fire(Trigger::PowerOnHold).unwrap();
        assert_eq!(h.transitions().len(), 1);
        assert_eq!(h.state(), PackState::RunTests);
    }

    #[test]
    fn test_transitions_outlive_controller_history() {
        let mut h = fixed_harness();
        h.power_on(true).unwrap();
        for _ in 0..10 {
            h.set_pedal(true);
            h.step();
            h.set_pedal(false);
            h.press_button();
            h.run_until(PackState::Sleep).unwrap();
            h.press_button();
            h.run_until(PackState::Idle).unwrap();
        }

        assert!(h.transitions().len() > 16);
        assert_eq!(h.controller().history().len(), 16);
    }
}
