//! Turns elapsed wall time into work for a driver loop: how many instructions
//! to step and how many 60 Hz timer ticks to deliver
use std::time::Duration;

/// The delay and sound timers count down at this rate
pub const TIMER_HZ: u32 = 60;

/// Upper bound on steps handed out by a single `Pacer::advance`, so a host
/// that stalls (a dragged window, a debugger pause) does not replay seconds
/// of instructions in one burst
pub const MAX_STEPS_PER_ADVANCE: u32 = 1024;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Ticks {
    pub steps: u32,
    pub timers: u32,
}

pub struct Pacer {
    step_interval: Duration,
    timer_interval: Duration,
    step_debt: Duration,
    timer_debt: Duration,
}

impl Pacer {
    /// `clock_hz` must be nonzero; `Config::validate` guarantees this for
    /// configured values
    pub fn new(clock_hz: u32) -> Self {
        Pacer {
            step_interval: Duration::from_secs(1) / clock_hz.max(1),
            timer_interval: Duration::from_secs(1) / TIMER_HZ,
            step_debt: Duration::from_secs(0),
            timer_debt: Duration::from_secs(0),
        }
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Account for `elapsed` time and return the work now due. Leftover time
    /// that doesn't make up a whole interval carries over to the next call
    pub fn advance(&mut self, elapsed: Duration) -> Ticks {
        self.step_debt += elapsed;
        self.timer_debt += elapsed;

        let mut ticks = Ticks::default();

        while self.step_debt >= self.step_interval {
            self.step_debt -= self.step_interval;
            ticks.steps += 1;

            if ticks.steps == MAX_STEPS_PER_ADVANCE {
                self.step_debt = Duration::from_secs(0);
                break;
            }
        }

        while self.timer_debt >= self.timer_interval {
            self.timer_debt -= self.timer_interval;
            ticks.timers += 1;
        }

        ticks
    }
}
