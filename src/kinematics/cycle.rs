//! Cycle repetition and direction sampling.
//!
//! A gait call repeats its cycle a number of times. The walking direction is only looked
//! at between cycles, so a direction change never tears a cycle apart.
use log::info;

use super::motion::CommandSource;
use crate::robot::leg::Direction;

/// Cycles remaining in one gait call. `None` repeats until the gait is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCounter {
    remaining: Option<u16>,
}

impl CycleCounter {
    /// `cycles == 0` means run until stopped.
    pub fn new(cycles: u16) -> Self {
        Self {
            remaining: (cycles != 0).then_some(cycles),
        }
    }

    pub fn remaining(&self) -> Option<u16> {
        self.remaining
    }

    /// Count one finished cycle. Returns whether another cycle should run.
    pub fn complete_cycle(&mut self) -> bool {
        match self.remaining.as_mut() {
            None => true,
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining > 0
            }
        }
    }
}

/// Direction in effect for the running cycle.
#[derive(Debug, Clone, Copy)]
pub struct DirectionTracker {
    current: Direction,
}

impl DirectionTracker {
    pub fn new<C: CommandSource>(source: &C) -> Self {
        Self {
            current: source.direction(),
        }
    }

    pub fn current(&self) -> Direction {
        self.current
    }

    /// Pick up the live direction at a cycle boundary.
    pub fn resample<C: CommandSource>(&mut self, source: &C) -> Direction {
        let live = source.direction();
        if live != self.current {
            info!("direction changed from {} to {}", self.current, live);
            self.current = live;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Control(Cell<Direction>);

    impl CommandSource for Control {
        fn direction(&self) -> Direction {
            self.0.get()
        }

        fn stop_requested(&self) -> bool {
            false
        }

        fn body_height(&self) -> u8 {
            80
        }
    }

    #[test]
    fn counts_down_to_zero() {
        let mut counter = CycleCounter::new(3);
        assert!(counter.complete_cycle());
        assert!(counter.complete_cycle());
        assert!(!counter.complete_cycle());
        assert_eq!(counter.remaining(), Some(0));
    }

    #[test]
    fn zero_runs_until_stopped() {
        let mut counter = CycleCounter::new(0);
        for _ in 0..1000 {
            assert!(counter.complete_cycle());
        }
        assert_eq!(counter.remaining(), None);
    }

    #[test]
    fn direction_only_changes_on_resample() {
        let control = Control(Cell::new(Direction::Forward));
        let mut tracker = DirectionTracker::new(&control);
        control.0.set(Direction::Left);
        assert_eq!(tracker.current(), Direction::Forward);
        assert_eq!(tracker.resample(&control), Direction::Left);
        assert_eq!(tracker.current(), Direction::Left);
    }
}
