//! Physical input signals
//!
//! [`Inputs`] is the latch between the environment and the controller: the
//! environment sets flags between ticks, the controller reads one snapshot
//! per tick and only ever clears flags it has consumed.
//!
//! The power button carries two distinct meanings. A short press toggles
//! sleep, a 5 second hold powers the pack on (or starts storage discharge).
//! [`HoldDetector`] turns the raw button level into those two events so the
//! controller never has to infer duration from its tick rate.

use crate::traits::TimeSource;

/// Default power button hold duration (ms)
pub const DEFAULT_HOLD_MS: u64 = 5_000;

/// Input flags written by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inputs {
    /// Accelerator pedal pressed (level)
    pub pedal_pressed: bool,
    /// Momentary power button press (latched until consumed)
    pub button_pressed: bool,
    /// Power button held for the hold duration (latched until consumed)
    pub button_held_5s: bool,
    /// Charger connected (level)
    pub charger_present: bool,
    /// External diagnostics (communication, charger status) passed
    pub diagnostics_pass: bool,
}

impl Inputs {
    /// Apply a button event to the latched flags
    pub fn latch(&mut self, event: ButtonEvent) {
        match event {
            ButtonEvent::Press => self.button_pressed = true,
            ButtonEvent::Hold => self.button_held_5s = true,
        }
    }

    /// Drop every user request (pedal, press, hold)
    pub fn clear_user_requests(&mut self) {
        self.pedal_pressed = false;
        self.button_pressed = false;
        self.button_held_5s = false;
    }
}

/// Discrete power button gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Pressed and released before the hold duration
    Press,
    /// Held for the hold duration (reported once per hold)
    Hold,
}

/// Converts a sampled button level into [`ButtonEvent`]s
///
/// Call [`HoldDetector::update`] with the raw level whenever it is sampled.
/// A hold is reported as soon as the duration is reached, not on release,
/// and the release that ends a hold produces no `Press`.
#[derive(Debug, Clone)]
pub struct HoldDetector {
    hold_ms: u64,
    /// Time the current press started, if the button is down
    pressed_since: Option<u64>,
    /// Whether `Hold` has already been reported for the current press
    hold_reported: bool,
}

impl HoldDetector {
    /// Detector with a custom hold duration
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            pressed_since: None,
            hold_reported: false,
        }
    }

    /// Hold duration (ms)
    pub fn hold_ms(&self) -> u64 {
        self.hold_ms
    }

    /// True while the button is down
    pub fn is_pressed(&self) -> bool {
        self.pressed_since.is_some()
    }

    /// Feed the current button level
    pub fn update<T: TimeSource>(&mut self, pressed: bool, time: &T) -> Option<ButtonEvent> {
        let now = time.now_ms();

        match (pressed, self.pressed_since) {
            (true, None) => {
                self.pressed_since = Some(now);
                self.hold_reported = false;
                self.check_hold(now)
            }
            (true, Some(_)) => self.check_hold(now),
            (false, Some(_)) => {
                self.pressed_since = None;
                if self.hold_reported {
                    self.hold_reported = false;
                    None
                } else {
                    Some(ButtonEvent::Press)
                }
            }
            (false, None) => None,
        }
    }

    fn check_hold(&mut self, now: u64) -> Option<ButtonEvent> {
        let since = self.pressed_since?;
        if !self.hold_reported && now.saturating_sub(since) >= self.hold_ms {
            self.hold_reported = true;
            Some(ButtonEvent::Hold)
        } else {
            None
        }
    }
}

impl Default for HoldDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_MS)
    }
}
