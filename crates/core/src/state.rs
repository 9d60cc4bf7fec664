//! Pack state machine types
//!
//! Closed enumeration of pack states and triggers plus the transition table.
//! The table is a `match` so the compiler checks every state is covered.
//!
//! ```text
//!  DeepSleep          ─hold──────────▶ RunTests
//!  RunTests           ─passed────────▶ Idle             ─failed───▶ DeepSleep
//!  Idle               ─pedal─────────▶ NormalOperation  ─button───▶ Sleep
//!  NormalOperation    ─fault─────────▶ FaultOperating   ─button / soc low─▶ Sleep
//!  FaultOperating     ─fatal─────────▶ DeepSleep        ─no fault─▶ NormalOperation  ─button─▶ Sleep
//!  Sleep              ─button────────▶ Idle             ─charger──▶ Charging  ─hold─▶ DischargeToStorage
//!  Charging           ─full──────────▶ Sleep
//!  DischargeToStorage ─storage target▶ DeepSleep
//! ```

use core::fmt;

/// Battery pack operating state
///
/// Exactly one state is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackState {
    /// Power rails off, long-term storage
    #[default]
    DeepSleep,
    /// Power-on self-test
    RunTests,
    /// Powered, waiting for pedal or button
    Idle,
    /// Driving with full current available
    NormalOperation,
    /// Driving with current limited while a non-fatal fault persists
    FaultOperating,
    /// Low-power standby with periodic OCV sampling
    Sleep,
    /// Controlled discharge to storage charge level
    DischargeToStorage,
    /// Charger connected, filling to 100 %
    Charging,
}

impl PackState {
    /// Every state, in declaration order
    pub const ALL: [PackState; 8] = [
        PackState::DeepSleep,
        PackState::RunTests,
        PackState::Idle,
        PackState::NormalOperation,
        PackState::FaultOperating,
        PackState::Sleep,
        PackState::DischargeToStorage,
        PackState::Charging,
    ];

    /// Short human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            PackState::DeepSleep => "deep_sleep",
            PackState::RunTests => "run_tests",
            PackState::Idle => "idle",
            PackState::NormalOperation => "normal_operation",
            PackState::FaultOperating => "fault_operating",
            PackState::Sleep => "sleep",
            PackState::DischargeToStorage => "discharge_to_storage",
            PackState::Charging => "charging",
        }
    }

    /// Whether the drive train is energised (telemetry advances each tick)
    pub const fn is_driving(self) -> bool {
        matches!(self, PackState::NormalOperation | PackState::FaultOperating)
    }
}

impl fmt::Display for PackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event that requests a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Power button held for the hold duration (5 s)
    PowerOnHold,
    /// Self-test succeeded
    TestsPassed,
    /// Self-test failed
    TestsFailed,
    /// Accelerator pressed
    PedalPressed,
    /// Momentary power button press
    ButtonPressed,
    /// State of charge at or below the low-charge limit
    SocLow,
    /// Non-fatal fault classifier tripped
    FaultDetected,
    /// Fatal fault classifier tripped
    FatalFault,
    /// Both classifiers clear
    NoFault,
    /// Charger connected
    ChargerPresent,
    /// State of charge reached 100 %
    FullyCharged,
    /// State of charge reached the storage target
    StorageTargetReached,
}

impl Trigger {
    /// Every trigger, in declaration order
    pub const ALL: [Trigger; 12] = [
        Trigger::PowerOnHold,
        Trigger::TestsPassed,
        Trigger::TestsFailed,
        Trigger::PedalPressed,
        Trigger::ButtonPressed,
        Trigger::SocLow,
        Trigger::FaultDetected,
        Trigger::FatalFault,
        Trigger::NoFault,
        Trigger::ChargerPresent,
        Trigger::FullyCharged,
        Trigger::StorageTargetReached,
    ];

    /// Short human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Trigger::PowerOnHold => "power_on_hold",
            Trigger::TestsPassed => "tests_passed",
            Trigger::TestsFailed => "tests_failed",
            Trigger::PedalPressed => "pedal_pressed",
            Trigger::ButtonPressed => "button_pressed",
            Trigger::SocLow => "soc_low",
            Trigger::FaultDetected => "fault_detected",
            Trigger::FatalFault => "fatal_fault",
            Trigger::NoFault => "no_fault",
            Trigger::ChargerPresent => "charger_present",
            Trigger::FullyCharged => "fully_charged",
            Trigger::StorageTargetReached => "storage_target_reached",
        }
    }

    /// True for triggers raised by the protection logic rather than the user
    pub const fn is_protective(self) -> bool {
        matches!(
            self,
            Trigger::FaultDetected | Trigger::FatalFault | Trigger::SocLow | Trigger::TestsFailed
        )
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination state for `trigger` fired in `state`, or `None` when the
/// trigger has no edge out of `state`.
pub const fn next_state(state: PackState, trigger: Trigger) -> Option<PackState> {
    use PackState::*;

    match (state, trigger) {
        (DeepSleep, Trigger::PowerOnHold) => Some(RunTests),
        (RunTests, Trigger::TestsPassed) => Some(Idle),
        (RunTests, Trigger::TestsFailed) => Some(DeepSleep),
        (Idle, Trigger::PedalPressed) => Some(NormalOperation),
        (Idle, Trigger::ButtonPressed) => Some(Sleep),
        (NormalOperation, Trigger::ButtonPressed) => Some(Sleep),
        (NormalOperation, Trigger::SocLow) => Some(Sleep),
        (NormalOperation, Trigger::FaultDetected) => Some(FaultOperating),
        (FaultOperating, Trigger::FatalFault) => Some(DeepSleep),
        (FaultOperating, Trigger::NoFault) => Some(NormalOperation),
        (FaultOperating, Trigger::ButtonPressed) => Some(Sleep),
        (Sleep, Trigger::ButtonPressed) => Some(Idle),
        (Sleep, Trigger::ChargerPresent) => Some(Charging),
        (Sleep, Trigger::PowerOnHold) => Some(DischargeToStorage),
        (Charging, Trigger::FullyCharged) => Some(Sleep),
        (DischargeToStorage, Trigger::StorageTargetReached) => Some(DeepSleep),
        _ => None,
    }
}

/// A transition that has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the transition
    pub from: PackState,
    /// State after the transition
    pub to: PackState,
    /// Trigger that caused it
    pub trigger: Trigger,
    /// Controller tick on which it fired
    pub tick: u64,
}

impl Transition {
    /// True when the pack was forced off by the fatal classifier
    pub fn is_fatal_shutdown(&self) -> bool {
        self.trigger == Trigger::FatalFault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_deep_sleep() {
        assert_eq!(PackState::default(), PackState::DeepSleep);
    }

    #[test]
    fn test_table_has_sixteen_edges() {
        let mut edges = 0;
        for state in PackState::ALL {
            for trigger in Trigger::ALL {
                if next_state(state, trigger).is_some() {
                    edges += 1;
                }
            }
        }
        assert_eq!(edges, 16);
    }

    #[test]
    fn test_button_press_destinations() {
        assert_eq!(
            next_state(PackState::Idle, Trigger::ButtonPressed),
            Some(PackState::Sleep)
        );
        assert_eq!(
            next_state(PackState::NormalOperation, Trigger::ButtonPressed),
            Some(PackState::Sleep)
        );
        assert_eq!(
            next_state(PackState::FaultOperating, Trigger::ButtonPressed),
            Some(PackState::Sleep)
        );
        assert_eq!(
            next_state(PackState::Sleep, Trigger::ButtonPressed),
            Some(PackState::Idle)
        );
        assert_eq!(next_state(PackState::DeepSleep, Trigger::ButtonPressed), None);
        assert_eq!(next_state(PackState::Charging, Trigger::ButtonPressed), None);
    }

    #[test]
    fn test_power_on_hold_is_state_dependent() {
        assert_eq!(
            next_state(PackState::DeepSleep, Trigger::PowerOnHold),
            Some(PackState::RunTests)
        );
        assert_eq!(
            next_state(PackState::Sleep, Trigger::PowerOnHold),
            Some(PackState::DischargeToStorage)
        );
        assert_eq!(next_state(PackState::Idle, Trigger::PowerOnHold), None);
    }

    #[test]
    fn test_deep_sleep_entries() {
        let sources: [(PackState, Trigger); 3] = [
            (PackState::RunTests, Trigger::TestsFailed),
            (PackState::FaultOperating, Trigger::FatalFault),
            (PackState::DischargeToStorage, Trigger::StorageTargetReached),
        ];
        for (state, trigger) in sources {
            assert_eq!(next_state(state, trigger), Some(PackState::DeepSleep));
        }
    }

    #[test]
    fn test_fatal_shutdown_flag() {
        let fatal = Transition {
            from: PackState::FaultOperating,
            to: PackState::DeepSleep,
            trigger: Trigger::FatalFault,
            tick: 7,
        };
        let storage = Transition {
            from: PackState::DischargeToStorage,
            to: PackState::DeepSleep,
            trigger: Trigger::StorageTargetReached,
            tick: 7,
        };
        assert!(fatal.is_fatal_shutdown());
        assert!(!storage.is_fatal_shutdown());
    }

    #[test]
    fn test_protective_triggers() {
        let protective: [Trigger; 4] = [
            Trigger::FaultDetected,
            Trigger::FatalFault,
            Trigger::SocLow,
            Trigger::TestsFailed,
        ];
        for trigger in Trigger::ALL {
            assert_eq!(
                trigger.is_protective(),
                protective.contains(&trigger),
                "{trigger}"
            );
        }
        assert!(!Trigger::NoFault.is_protective());
    }
}
