//! Pack supervisory controller
//!
//! Owns the pack state, drives the [`TelemetrySource`] and decides transitions.
//! An external loop calls [`PackController::tick`] once per time unit; the
//! controller never blocks.
//!
//! # Tick
//!
//! Every tick runs in a fixed order:
//!
//! 1. Snapshot the [`Inputs`] (authoritative for the whole tick)
//! 2. Run the current state's step: telemetry mutation, fault evaluation,
//!    and at most one trigger request
//! 3. Apply the requested trigger through the transition table, then run the
//!    destination's entry effects
//!
//! Step functions only *request* a trigger; mutation of the state field
//! happens in [`PackController::fire`].
//!
//! # Guard priority
//!
//! Safety first (fatal, then non-fatal), then charge level, then user input.
//! A button press never masks a fault on the same tick.

use pack_bms_core::error::TransitionError;
use pack_bms_core::fault::{FaultClassifier, FaultReport};
use pack_bms_core::history::TransitionLog;
use pack_bms_core::inputs::Inputs;
use pack_bms_core::parameters::{PackParams, ParameterError};
use pack_bms_core::sleep::SleepSchedule;
use pack_bms_core::state::{next_state, PackState, Transition, Trigger};
use pack_bms_core::telemetry::{Telemetry, TelemetrySource, SOC_FULL};

/// Current scale while driving without a fault
const FULL_CURRENT: f64 = 1.0;

/// Result of one [`PackController::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// State after the tick
    pub state: PackState,
    /// Transition applied during the tick, if any
    pub transition: Option<Transition>,
}

impl TickOutcome {
    /// True if the tick changed state
    pub fn transitioned(&self) -> bool {
        self.transition.is_some()
    }
}

/// Battery pack supervisory state machine
///
/// Generic over the telemetry source so firmware, the host simulator and
/// tests can each supply their own. Pass `&mut source` to keep ownership on
/// the caller's side.
pub struct PackController<S: TelemetrySource> {
    state: PackState,
    source: S,
    inputs: Inputs,
    params: PackParams,
    classifier: FaultClassifier,
    sleep: SleepSchedule,
    faults: FaultReport,
    tick_count: u64,
    last_transition: Option<Transition>,
    history: TransitionLog,
}

impl<S: TelemetrySource> PackController<S> {
    /// Create a controller in `DeepSleep`
    ///
    /// # Errors
    ///
    /// Returns the validation error if `params` is unusable.
    pub fn new(source: S, params: PackParams) -> Result<Self, ParameterError> {
        params.validate()?;
        let classifier = params
            .classifier()
            .ok_or(ParameterError::InconsistentLimits)?;
        Ok(Self::build(source, params, classifier))
    }

    /// Create a controller with the default parameters
    pub fn with_defaults(source: S) -> Self {
        Self::build(source, PackParams::default(), FaultClassifier::default())
    }

    fn build(source: S, params: PackParams, classifier: FaultClassifier) -> Self {
        Self {
            state: PackState::DeepSleep,
            source,
            inputs: Inputs::default(),
            params,
            classifier,
            sleep: SleepSchedule::new(params.sleep_max_interval_ticks),
            faults: FaultReport::default(),
            tick_count: 0,
            last_transition: None,
            history: TransitionLog::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> PackState {
        self.state
    }

    /// Latest telemetry snapshot
    pub fn telemetry(&self) -> &Telemetry {
        self.source.telemetry()
    }

    /// Telemetry source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable telemetry source (fault injection, sensor overrides)
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Input flags as last written
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Input flags, for the environment to write between ticks
    pub fn inputs_mut(&mut self) -> &mut Inputs {
        &mut self.inputs
    }

    /// Active parameters
    pub fn params(&self) -> &PackParams {
        &self.params
    }

    /// Classifier result from the most recent driving tick
    pub fn faults(&self) -> FaultReport {
        self.faults
    }

    /// Sleep wake-up schedule
    pub fn sleep_schedule(&self) -> &SleepSchedule {
        &self.sleep
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Most recent transition
    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    /// Recent transitions
    pub fn history(&self) -> &TransitionLog {
        &self.history
    }

    /// True when the pack sits in `DeepSleep` because of a fatal fault
    ///
    /// Distinguishes a protective shutdown from a failed self-test or a
    /// finished storage discharge.
    pub fn is_fatal_shutdown(&self) -> bool {
        self.state == PackState::DeepSleep
            && self
                .last_transition
                .is_some_and(|t| t.is_fatal_shutdown())
    }

    /// Apply `trigger` if the transition table has an edge for it
    ///
    /// Only the table is consulted; guards are evaluated by [`tick`]. On
    /// success the consumed input is cleared and the destination's entry
    /// effects run.
    ///
    /// # Errors
    ///
    /// [`TransitionError::InvalidTrigger`] if the current state has no edge
    /// for `trigger`. The state is left unchanged.
    ///
    /// [`tick`]: PackController::tick
    pub fn fire(&mut self, trigger: Trigger) -> Result<Transition, TransitionError> {
        let from = self.state;
        let Some(to) = next_state(from, trigger) else {
            crate::log_warn!(
                "Pack: trigger {} rejected in {}",
                trigger.name(),
                from.name()
            );
            return Err(TransitionError::InvalidTrigger {
                state: from,
                trigger,
            });
        };

        let transition = Transition {
            from,
            to,
            trigger,
            tick: self.tick_count,
        };

        self.consume(trigger);
        self.state = to;
        self.enter(to);
        self.last_transition = Some(transition);
        self.history.record(transition);

        if transition.is_fatal_shutdown() {
            crate::log_error!(
                "Pack: {} -> {} (fatal fault shutdown)",
                from.name(),
                to.name()
            );
        } else if trigger.is_protective() {
            crate::log_warn!(
                "Pack: {} -> {} ({})",
                from.name(),
                to.name(),
                trigger.name()
            );
        } else {
            crate::log_info!(
                "Pack: {} -> {} ({})",
                from.name(),
                to.name(),
                trigger.name()
            );
        }

        Ok(transition)
    }

    /// Advance the controller by one time unit
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_count = self.tick_count.saturating_add(1);
        let inputs = self.inputs;

        let request = match self.state {
            PackState::DeepSleep => Self::step_deep_sleep(&inputs),
            PackState::RunTests => self.step_run_tests(&inputs),
            PackState::Idle => Self::step_idle(&inputs),
            PackState::NormalOperation => self.step_normal(&inputs),
            PackState::FaultOperating => self.step_fault_operating(&inputs),
            PackState::Sleep => self.step_sleep(&inputs),
            PackState::DischargeToStorage => self.step_discharge_to_storage(),
            PackState::Charging => self.step_charging(),
        };

        // Step functions only request edges that exist out of their own state
        let transition = request.and_then(|trigger| self.fire(trigger).ok());

        TickOutcome {
            state: self.state,
            transition,
        }
    }

    // ------------------------------------------------------------------------
    // Per-state steps
    // ------------------------------------------------------------------------

    fn step_deep_sleep(inputs: &Inputs) -> Option<Trigger> {
        inputs.button_held_5s.then_some(Trigger::PowerOnHold)
    }

    // Runs on the tick after entry. The readings checked are the baseline
    // written by `enter(RunTests)` unless something changed them in between.
    fn step_run_tests(&mut self, inputs: &Inputs) -> Option<Trigger> {
        let report = self.classifier.classify(self.source.telemetry());

        if inputs.diagnostics_pass && report.is_clear() {
            Some(Trigger::TestsPassed)
        } else {
            if report.is_non_fatal() {
                crate::log_warn!(
                    "Pack: self-test reading out of range ({})",
                    report.non_fatal.primary_name()
                );
            } else {
                crate::log_warn!("Pack: external diagnostics failed");
            }
            Some(Trigger::TestsFailed)
        }
    }

    fn step_idle(inputs: &Inputs) -> Option<Trigger> {
        if inputs.pedal_pressed {
            Some(Trigger::PedalPressed)
        } else if inputs.button_pressed {
            Some(Trigger::ButtonPressed)
        } else {
            None
        }
    }

    fn step_normal(&mut self, inputs: &Inputs) -> Option<Trigger> {
        let report = self.drive(inputs.pedal_pressed, FULL_CURRENT);

        if report.is_non_fatal() {
            Some(Trigger::FaultDetected)
        } else if self.source.telemetry().soc <= self.params.soc_low {
            Some(Trigger::SocLow)
        } else if inputs.button_pressed {
            Some(Trigger::ButtonPressed)
        } else {
            None
        }
    }

    fn step_fault_operating(&mut self, inputs: &Inputs) -> Option<Trigger> {
        let report = self.drive(inputs.pedal_pressed, self.params.fault_limit_proportion);

        if report.is_fatal() {
            Some(Trigger::FatalFault)
        } else if report.is_clear() {
            Some(Trigger::NoFault)
        } else if inputs.button_pressed {
            Some(Trigger::ButtonPressed)
        } else {
            None
        }
    }

    fn step_sleep(&mut self, inputs: &Inputs) -> Option<Trigger> {
        if !self.sleep.poll() {
            return None;
        }

        self.source.sample_ocv();
        let telemetry = self.source.telemetry();
        crate::log_debug!("Pack: wake {} OCV {} V", self.sleep.wakes(), telemetry.ocv);

        // Narrower than the table's charger guard: a full pack stays asleep
        // on the dock instead of bouncing through Charging every wake.
        if inputs.charger_present && telemetry.soc < SOC_FULL {
            Some(Trigger::ChargerPresent)
        } else if inputs.button_held_5s {
            Some(Trigger::PowerOnHold)
        } else if inputs.button_pressed {
            Some(Trigger::ButtonPressed)
        } else {
            None
        }
    }

    fn step_discharge_to_storage(&mut self) -> Option<Trigger> {
        let target = self.params.storage_soc_target;

        if self.source.telemetry().soc > target {
            self.source.drain_soc(self.params.storage_step);
            let telemetry = self.source.telemetry_mut();
            telemetry.soc = telemetry.soc.max(target);
        }

        (self.source.telemetry().soc <= target).then_some(Trigger::StorageTargetReached)
    }

    // No fault monitoring while charging; the charger circuit is assumed to
    // protect the cells.
    fn step_charging(&mut self) -> Option<Trigger> {
        let telemetry = self.source.telemetry_mut();
        telemetry.soc = (telemetry.soc + self.params.charge_step).min(SOC_FULL);

        (telemetry.soc >= SOC_FULL).then_some(Trigger::FullyCharged)
    }

    /// One driving step: move telemetry, consume charge, classify
    fn drive(&mut self, pedal_pressed: bool, limit_proportion: f64) -> FaultReport {
        self.source.advance(pedal_pressed, limit_proportion);
        self.source.drain_soc(self.params.drive_soc_drain);

        let telemetry = self.source.telemetry();
        crate::log_trace!(
            "Pack: V={} I={} T={} soc={}",
            telemetry.voltage,
            telemetry.current,
            telemetry.temp_proxy_voltage,
            telemetry.soc
        );

        let report = self.classifier.classify(telemetry);
        self.note_faults(report);
        report
    }

    fn note_faults(&mut self, report: FaultReport) {
        if report == self.faults {
            return;
        }

        if report.is_fatal() && report.fatal != self.faults.fatal {
            crate::log_error!("Pack: fatal limit tripped ({})", report.fatal.primary_name());
        } else if report.is_non_fatal() && report.non_fatal != self.faults.non_fatal {
            crate::log_warn!(
                "Pack: non-fatal limit tripped ({})",
                report.non_fatal.primary_name()
            );
        } else if report.is_clear() {
            crate::log_info!("Pack: all limits clear");
        }

        self.faults = report;
    }

    // ------------------------------------------------------------------------
    // Transition effects
    // ------------------------------------------------------------------------

    fn consume(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::ButtonPressed => self.inputs.button_pressed = false,
            Trigger::PowerOnHold => self.inputs.button_held_5s = false,
            _ => {}
        }
    }

    fn enter(&mut self, state: PackState) {
        match state {
            PackState::DeepSleep => {
                let telemetry = self.source.telemetry_mut();
                telemetry.voltage = 0.0;
                telemetry.current = 0.0;
                self.inputs.clear_user_requests();
                self.faults = FaultReport::default();
            }
            PackState::RunTests => {
                self.source.telemetry_mut().apply_self_test_baseline();
            }
            PackState::Sleep => {
                self.source.telemetry_mut().current = 0.0;
                self.inputs.clear_user_requests();
                self.sleep.reset();
                self.faults = FaultReport::default();
            }
            PackState::Idle
            | PackState::NormalOperation
            | PackState::FaultOperating
            | PackState::DischargeToStorage
            | PackState::Charging => {}
        }
    }
}
