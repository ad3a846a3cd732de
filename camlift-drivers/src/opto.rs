//! GPIO opto output
//!
//! Presents the emulated opto sensor to the legacy controller on a single
//! GPIO. `Blocked` drives the line high unless the output is inverted
//! (e.g. when it feeds an open-collector stage).

use core::convert::Infallible;

use camlift_core::traits::{OptoOutput, OptoState};
use embedded_hal::digital::OutputPin;

use crate::drive;

/// GPIO-backed opto output
pub struct GpioOpto<P> {
    pin: P,
    /// If true, `Blocked` = pin LOW
    inverted: bool,
    state: OptoState,
}

impl<P: OutputPin<Error = Infallible>> GpioOpto<P> {
    /// Create an opto output, initially `Open`
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut opto = Self {
            pin,
            inverted,
            state: OptoState::Open,
        };
        opto.set(OptoState::Open);
        opto
    }
}

impl<P: OutputPin<Error = Infallible>> OptoOutput for GpioOpto<P> {
    fn set(&mut self, state: OptoState) {
        self.state = state;
        let blocked = state == OptoState::Blocked;
        drive(&mut self.pin, blocked != self.inverted);
    }

    fn state(&self) -> OptoState {
        self.state
    }
}
