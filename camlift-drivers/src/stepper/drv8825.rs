//! DRV8825 stepper driver (step/dir interface)
//!
//! The DRV8825 is driven entirely through GPIO:
//! - STEP: one microstep per rising edge
//! - DIR: sampled on the rising STEP edge, needs a short setup time
//! - nENBL: active-low output enable
//! - M0..M2: microstep mode select
//! - nRESET: active-low, holds the indexer at home while asserted
//!
//! Pulses are timed with a blocking `DelayNs`; the step line is high for
//! one half-period and low for the other.

use core::convert::Infallible;

use camlift_core::traits::{Direction, Microsteps, StepperDriver};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::drive;

/// DRV8825 timing configuration
#[derive(Debug, Clone, Copy)]
pub struct Drv8825Config {
    /// Delay after a direction change before the next step edge (µs)
    pub direction_setup_us: u32,
    /// DIR level for clockwise rotation
    pub clockwise_high: bool,
}

impl Default for Drv8825Config {
    fn default() -> Self {
        Self {
            direction_setup_us: 5,
            clockwise_high: true,
        }
    }
}

/// DRV8825 driver
pub struct Drv8825<P, DL> {
    step: P,
    dir: P,
    enable_n: P,
    mode: [P; 3],
    reset_n: P,
    delay: DL,
    config: Drv8825Config,
    direction: Direction,
    microsteps: Microsteps,
    enabled: bool,
}

impl<P, DL> Drv8825<P, DL>
where
    P: OutputPin<Error = Infallible>,
    DL: DelayNs,
{
    /// Create a driver with outputs disabled and reset asserted
    pub fn new(
        step: P,
        dir: P,
        enable_n: P,
        mode: [P; 3],
        reset_n: P,
        delay: DL,
        config: Drv8825Config,
    ) -> Self {
        let mut driver = Self {
            step,
            dir,
            enable_n,
            mode,
            reset_n,
            delay,
            config,
            direction: Direction::Clockwise,
            microsteps: Microsteps::Full,
            enabled: false,
        };

        drive(&mut driver.step, false);
        driver.enable(false);
        driver.set_reset(true);
        driver.set_microsteps(Microsteps::Full);
        driver.write_direction();
        driver
    }

    /// Get the configuration
    pub fn config(&self) -> &Drv8825Config {
        &self.config
    }

    /// Get the microstep resolution
    pub fn microsteps(&self) -> Microsteps {
        self.microsteps
    }

    fn write_direction(&mut self) {
        let high = (self.direction == Direction::Clockwise) == self.config.clockwise_high;
        drive(&mut self.dir, high);
    }
}

impl<P, DL> StepperDriver for Drv8825<P, DL>
where
    P: OutputPin<Error = Infallible>,
    DL: DelayNs,
{
    fn set_direction(&mut self, dir: Direction) {
        if dir == self.direction {
            return;
        }
        self.direction = dir;
        self.write_direction();
        self.delay.delay_us(self.config.direction_setup_us);
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_microsteps(&mut self, microsteps: Microsteps) {
        self.microsteps = microsteps;
        for (pin, high) in self.mode.iter_mut().zip(microsteps.mode_pins()) {
            drive(pin, high);
        }
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        drive(&mut self.enable_n, !enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_reset(&mut self, asserted: bool) {
        drive(&mut self.reset_n, !asserted);
    }

    fn step(&mut self, half_period_us: u32) {
        drive(&mut self.step, true);
        self.delay.delay_us(half_period_us);
        drive(&mut self.step, false);
        self.delay.delay_us(half_period_us);
    }
}
