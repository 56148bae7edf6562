//! Process-wide control state.
//!
//! The command source (the network task) writes the walking direction, the stop flag and
//! the body height here at any time; the gait engine only reads them through
//! [`CommandSource`], at the points where a gait samples them.
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::config::{BODY_HEIGHT_DEFAULT, BODY_HEIGHT_MAX, BODY_HEIGHT_MIN, BODY_HEIGHT_STEP};
use super::leg::Direction;
use crate::kinematics::motion::CommandSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub direction: Direction,
    pub stop_requested: bool,
    pub body_height: u8,
}

impl ControlState {
    pub const fn new() -> Self {
        Self {
            direction: Direction::Forward,
            stop_requested: false,
            body_height: BODY_HEIGHT_DEFAULT,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SharedControl {
    state: Mutex<CriticalSectionRawMutex, Cell<ControlState>>,
    busy: AtomicBool,
}

pub static CONTROL: SharedControl = SharedControl::new();

impl SharedControl {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(ControlState::new())),
            busy: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ControlState {
        self.state.lock(|state| state.get())
    }

    fn update(&self, f: impl FnOnce(&mut ControlState)) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);
        });
    }

    pub fn set_direction(&self, direction: Direction) {
        self.update(|state| state.direction = direction);
    }

    pub fn request_stop(&self) {
        self.update(|state| state.stop_requested = true);
    }

    pub fn clear_stop(&self) {
        self.update(|state| state.stop_requested = false);
    }

    /// Change the body height by `steps` increments, clamped to the allowed range.
    pub fn adjust_body_height(&self, steps: i8) -> u8 {
        let mut height = 0;
        self.update(|state| {
            let wanted = state.body_height as i16 + steps as i16 * BODY_HEIGHT_STEP as i16;
            state.body_height = wanted.clamp(BODY_HEIGHT_MIN as i16, BODY_HEIGHT_MAX as i16) as u8;
            height = state.body_height;
        });
        height
    }

    /// Whether a gait is executing right now.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }
}

impl Default for SharedControl {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSource for SharedControl {
    fn direction(&self) -> Direction {
        self.state().direction
    }

    fn stop_requested(&self) -> bool {
        self.state().stop_requested
    }

    fn body_height(&self) -> u8 {
        self.state().body_height
    }
}
