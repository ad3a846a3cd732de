//! Test doubles for the hardware traits

use core::cell::Cell;
use std::vec::Vec;

use crate::traits::{Clock, Direction, Microsteps, OptoOutput, OptoState, StepperDriver};

/// Stepper driver that records every call and advances a shared clock
pub struct MockDriver<'c> {
    pub direction: Direction,
    pub microsteps: Microsteps,
    pub enabled: bool,
    pub reset: bool,
    pub pulses: Vec<(Direction, u32)>,
    pub position: i64,
    clock: Option<&'c MockClock>,
}

impl<'c> MockDriver<'c> {
    pub fn new() -> Self {
        Self {
            direction: Direction::Clockwise,
            microsteps: Microsteps::Full,
            enabled: false,
            reset: false,
            pulses: Vec::new(),
            position: 0,
            clock: None,
        }
    }

    /// Driver whose pulses advance `clock` by their period
    pub fn with_clock(clock: &'c MockClock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new()
        }
    }
}

impl StepperDriver for MockDriver<'_> {
    fn set_direction(&mut self, dir: Direction) {
        self.direction = dir;
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_microsteps(&mut self, microsteps: Microsteps) {
        self.microsteps = microsteps;
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
    }

    fn step(&mut self, half_period_us: u32) {
        self.pulses.push((self.direction, half_period_us));
        self.position += self.direction.sign() as i64;
        if let Some(clock) = self.clock {
            clock.advance_us(2 * half_period_us as u64);
        }
    }
}

/// Opto output that records every state it is set to
pub struct MockOpto {
    pub state: OptoState,
    pub changes: Vec<OptoState>,
}

impl MockOpto {
    pub fn new() -> Self {
        Self {
            state: OptoState::Open,
            changes: Vec::new(),
        }
    }
}

impl OptoOutput for MockOpto {
    fn set(&mut self, state: OptoState) {
        self.state = state;
        self.changes.push(state);
    }

    fn state(&self) -> OptoState {
        self.state
    }
}

/// Manually advanced clock with microsecond resolution
pub struct MockClock {
    us: Cell<u64>,
}

impl MockClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            us: Cell::new(start_ms as u64 * 1000),
        }
    }

    pub fn advance_us(&self, us: u64) {
        self.us.set(self.us.get() + us);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        (self.us.get() / 1000) as u32
    }
}
