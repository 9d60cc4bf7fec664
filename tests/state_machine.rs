//! Transition table and end-to-end controller behaviour

use pack_bms::subsystems::PackController;
use pack_bms_core::error::TransitionError;
use pack_bms_core::fault::{is_fatal_fault, is_non_fatal_fault};
use pack_bms_core::state::{next_state, PackState, Trigger};
use pack_bms_core::telemetry::{FixedSource, Telemetry, TelemetrySource};

const EPS: f64 = 1e-9;

/// Shortest trigger path from power-on to `state`
fn path_to(state: PackState) -> &'static [Trigger] {
    use Trigger::*;

    match state {
        PackState::DeepSleep => &[],
        PackState::RunTests => &[PowerOnHold],
        PackState::Idle => &[PowerOnHold, TestsPassed],
        PackState::NormalOperation => &[PowerOnHold, TestsPassed, PedalPressed],
        PackState::FaultOperating => &[PowerOnHold, TestsPassed, PedalPressed, FaultDetected],
        PackState::Sleep => &[PowerOnHold, TestsPassed, ButtonPressed],
        PackState::DischargeToStorage => &[PowerOnHold, TestsPassed, ButtonPressed, PowerOnHold],
        PackState::Charging => &[PowerOnHold, TestsPassed, ButtonPressed, ChargerPresent],
    }
}

fn controller_in(state: PackState) -> PackController<FixedSource> {
    let mut c = PackController::with_defaults(FixedSource::new());
    for trigger in path_to(state) {
        c.fire(*trigger).expect("path uses valid edges");
    }
    c
}

#[test]
fn test_every_state_reachable() {
    for state in PackState::ALL {
        assert_eq!(controller_in(state).state(), state);
    }
}

#[test]
fn test_triggers_outside_table_are_rejected() {
    for state in PackState::ALL {
        for trigger in Trigger::ALL {
            let mut c = controller_in(state);
            let history_len = c.history().len();
            let telemetry = *c.telemetry();

            match next_state(state, trigger) {
                Some(to) => {
                    let transition = c.fire(trigger).expect("edge exists");
                    assert_eq!(transition.from, state);
                    assert_eq!(transition.to, to);
                    assert_eq!(c.state(), to);
                }
                None => {
                    assert_eq!(
                        c.fire(trigger),
                        Err(TransitionError::InvalidTrigger { state, trigger }),
                        "{state} / {trigger}"
                    );
                    assert_eq!(c.state(), state);
                    assert_eq!(c.history().len(), history_len);
                    assert_eq!(*c.telemetry(), telemetry);
                }
            }
        }
    }
}

#[test]
fn test_invalid_trigger_message() {
    let err = TransitionError::InvalidTrigger {
        state: PackState::Charging,
        trigger: Trigger::PedalPressed,
    };
    assert_eq!(
        err.to_string(),
        "trigger 'pedal_pressed' is not valid in state 'charging'"
    );
}

#[test]
fn test_deep_sleep_absorbs_without_hold() {
    let mut c = PackController::with_defaults(FixedSource::new());
    let start = *c.telemetry();

    for i in 0..500 {
        let inputs = c.inputs_mut();
        inputs.pedal_pressed = i % 2 == 0;
        inputs.button_pressed = i % 3 == 0;
        inputs.charger_present = i % 5 == 0;
        inputs.diagnostics_pass = true;

        assert_eq!(c.tick().state, PackState::DeepSleep);
    }

    assert_eq!(*c.telemetry(), start);
    assert!(c.last_transition().is_none());
}

#[test]
fn test_fatal_implies_non_fatal_sweep() {
    let mut voltage = 2.0;
    while voltage <= 4.6 {
        let mut current = 0.0;
        while current <= 130.0 {
            let mut temp = 1.4;
            while temp <= 2.5 {
                let t = Telemetry {
                    voltage,
                    current,
                    temp_proxy_voltage: temp,
                    ..Telemetry::nominal()
                };
                if is_fatal_fault(&t) {
                    assert!(is_non_fatal_fault(&t), "{t:?}");
                }
                temp += 0.01;
            }
            current += 2.5;
        }
        voltage += 0.05;
    }
}

#[test]
fn test_safety_precedence_in_normal_operation() {
    let mut c = controller_in(PackState::NormalOperation);
    c.source_mut().telemetry_mut().current = 112.0;
    c.inputs_mut().button_pressed = true;

    let outcome = c.tick();
    assert_eq!(outcome.state, PackState::FaultOperating);
    assert_ne!(outcome.state, PackState::Sleep);
}

#[test]
fn test_storage_discharge_from_eighty() {
    let mut c = controller_in(PackState::DischargeToStorage);
    c.source_mut().telemetry_mut().soc = 80.0;

    let mut previous = 80.0;
    let mut ticks = 0;
    loop {
        let outcome = c.tick();
        ticks += 1;
        let soc = c.telemetry().soc;
        assert!(soc >= 50.0 - EPS);
        assert!((previous - soc - 1.0).abs() < EPS);
        previous = soc;

        if outcome.transitioned() {
            assert_eq!(outcome.state, PackState::DeepSleep);
            assert!((soc - 50.0).abs() < EPS);
            break;
        }
        assert!(ticks < 100, "discharge never finished");
    }
    assert_eq!(ticks, 30);
}

#[test]
fn test_storage_discharge_unmonitored_until_target() {
    let mut c = controller_in(PackState::DischargeToStorage);
    let telemetry = c.source_mut().telemetry_mut();
    telemetry.soc = 53.0;
    telemetry.voltage = 2.0;
    telemetry.temp_proxy_voltage = 1.4;

    let states: Vec<_> = (0..3).map(|_| c.tick().state).collect();

    assert_eq!(
        states,
        [
            PackState::DischargeToStorage,
            PackState::DischargeToStorage,
            PackState::DeepSleep
        ]
    );
    assert_eq!(
        c.last_transition().map(|t| t.trigger),
        Some(Trigger::StorageTargetReached)
    );
    assert!(!c.is_fatal_shutdown());
}

#[test]
fn test_charging_from_ninety_seven() {
    let mut c = controller_in(PackState::Charging);
    c.source_mut().telemetry_mut().soc = 97.0;

    let outcomes: Vec<_> = (0..3).map(|_| c.tick()).collect();

    assert!(!outcomes[0].transitioned());
    assert!(!outcomes[1].transitioned());
    assert_eq!(outcomes[2].state, PackState::Sleep);
    assert!((c.telemetry().soc - 100.0).abs() < EPS);
}

#[test]
fn test_power_on_to_fault_operating() {
    let mut c = PackController::with_defaults(FixedSource::new());

    c.inputs_mut().button_held_5s = true;
    assert_eq!(c.tick().state, PackState::RunTests);

    c.inputs_mut().diagnostics_pass = true;
    assert_eq!(c.tick().state, PackState::Idle);

    c.inputs_mut().pedal_pressed = true;
    assert_eq!(c.tick().state, PackState::NormalOperation);

    c.source_mut().telemetry_mut().voltage = 2.6;
    let outcome = c.tick();
    assert_eq!(outcome.state, PackState::FaultOperating);
    assert_eq!(
        outcome.transition.map(|t| t.trigger),
        Some(Trigger::FaultDetected)
    );
}

#[test]
fn test_fault_operating_to_fatal_shutdown() {
    let mut c = controller_in(PackState::FaultOperating);
    c.inputs_mut().pedal_pressed = true;

    c.source_mut().telemetry_mut().voltage = 2.4;
    let outcome = c.tick();

    assert_eq!(outcome.state, PackState::DeepSleep);
    let cause = c.last_transition().map(|t| t.trigger);
    assert_eq!(cause, Some(Trigger::FatalFault));
    assert!(c.is_fatal_shutdown());
    assert_eq!(c.history().count_trigger(Trigger::FatalFault), 1);
}

#[test]
fn test_deep_sleep_causes_are_distinguishable() {
    let mut failed = controller_in(PackState::RunTests);
    failed.tick();
    assert_eq!(failed.state(), PackState::DeepSleep);
    assert!(!failed.is_fatal_shutdown());

    let mut stored = controller_in(PackState::DischargeToStorage);
    stored.source_mut().telemetry_mut().soc = 51.0;
    stored.tick();
    assert_eq!(stored.state(), PackState::DeepSleep);
    assert!(!stored.is_fatal_shutdown());

    let mut fatal = controller_in(PackState::FaultOperating);
    fatal.source_mut().telemetry_mut().temp_proxy_voltage = 2.4;
    fatal.tick();
    assert_eq!(fatal.state(), PackState::DeepSleep);
    assert!(fatal.is_fatal_shutdown());
}

#[test]
fn test_borrowed_source_stays_with_caller() {
    let mut source = FixedSource::with_telemetry(Telemetry {
        soc: 60.0,
        ..Telemetry::nominal()
    });

    {
        let mut c = PackController::with_defaults(&mut source);
        for trigger in path_to(PackState::NormalOperation) {
            c.fire(*trigger).expect("valid edge");
        }
        c.inputs_mut().pedal_pressed = true;
        c.tick();
        c.tick();
    }

    assert_eq!(source.advance_calls(), 2);
    assert!((source.telemetry().soc - 59.0).abs() < EPS);
}
