//! Sleep wake-up schedule
//!
//! While sleeping the controller only wakes to sample OCV and look at its
//! inputs. The gap between wake-ups doubles after every wake (1, 2, 4, 8, ...
//! ticks) so a parked pack spends less and less energy on housekeeping. The
//! gap saturates at a configured maximum.

/// Default ceiling for the wake-up gap (ticks)
pub const DEFAULT_MAX_INTERVAL_TICKS: u64 = 1024;

/// Tick counter for doubling-interval wake-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepSchedule {
    /// Gap before the next wake (ticks)
    interval: u64,
    /// Ticks left until the next wake
    remaining: u64,
    /// Upper bound for `interval`
    max_interval: u64,
    /// Wake-ups since the last reset
    wakes: u32,
}

impl SleepSchedule {
    /// Schedule with the given interval ceiling (clamped to at least 1)
    pub const fn new(max_interval: u64) -> Self {
        let max_interval = if max_interval == 0 { 1 } else { max_interval };
        Self {
            interval: 1,
            remaining: 1,
            max_interval,
            wakes: 0,
        }
    }

    /// Restart at a one-tick gap (called on entering sleep)
    pub fn reset(&mut self) {
        self.interval = 1;
        self.remaining = 1;
        self.wakes = 0;
    }

    /// Count one tick; returns `true` when this tick is a wake-up
    ///
    /// On a wake the gap doubles for the next one.
    pub fn poll(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return false;
        }

        self.wakes = self.wakes.saturating_add(1);
        self.interval = self.interval.saturating_mul(2).min(self.max_interval);
        self.remaining = self.interval;
        true
    }

    /// Gap that will precede the next wake-up (ticks)
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Ticks left before the next wake-up
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Wake-ups since the last reset
    pub fn wakes(&self) -> u32 {
        self.wakes
    }
}

impl Default for SleepSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INTERVAL_TICKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tick numbers (1-based) on which the schedule wakes, within `ticks`
    fn wake_ticks(schedule: &mut SleepSchedule, ticks: u64) -> heapless::Vec<u64, 32> {
        let mut woke = heapless::Vec::new();
        for tick in 1..=ticks {
            if schedule.poll() {
                let _ = woke.push(tick);
            }
        }
        woke
    }

    #[test]
    fn test_first_tick_wakes() {
        let mut schedule = SleepSchedule::default();
        assert!(schedule.poll());
        assert_eq!(schedule.wakes(), 1);
    }

    #[test]
    fn test_intervals_double() {
        let mut schedule = SleepSchedule::default();
        let woke = wake_ticks(&mut schedule, 40);
        // gaps of 1, 2, 4, 8, 16
        assert_eq!(woke.as_slice(), &[1, 3, 7, 15, 31]);
    }

    #[test]
    fn test_interval_saturates_at_max() {
        let mut schedule = SleepSchedule::new(4);
        let woke = wake_ticks(&mut schedule, 20);
        assert_eq!(woke.as_slice(), &[1, 3, 7, 11, 15, 19]);
        assert_eq!(schedule.interval(), 4);
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut schedule = SleepSchedule::default();
        wake_ticks(&mut schedule, 10);
        assert!(schedule.interval() > 1);

        schedule.reset();
        assert_eq!(schedule.interval(), 1);
        assert_eq!(schedule.remaining(), 1);
        assert_eq!(schedule.wakes(), 0);
        assert!(schedule.poll());
    }

    #[test]
    fn test_zero_max_is_clamped() {
        let mut schedule = SleepSchedule::new(0);
        assert!(schedule.poll());
        assert!(schedule.poll());
        assert!(schedule.poll());
    }
}
