//! Startup homing
//!
//! Steps the lift counter-clockwise (down) at a constant rate until the
//! debounced limit switch reports a press. The limit is sampled before every
//! pulse; the step budget bounds the search so a broken switch cannot drive
//! the lift into its end stop forever.

use crate::config::HomingConfig;
use crate::debounce::{Debouncer, InputId};
use crate::traits::{Clock, Direction, StepperDriver};

/// Homing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingError {
    /// Step budget exhausted without a limit press
    LimitNotFound,
}

/// Result of a successful homing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingReport {
    /// Pulses emitted before the limit press was confirmed
    pub steps: u32,
    /// Timestamp of the confirmed press
    pub at_ms: u32,
}

/// Homing sequence
#[derive(Debug, Clone, Copy)]
pub struct Homing {
    config: HomingConfig,
}

impl Homing {
    /// Create a homing sequence with the given rate and step budget
    pub fn new(config: HomingConfig) -> Self {
        Self { config }
    }

    /// Seek the limit switch
    ///
    /// `limit_raw` returns the raw (active-low) limit pin level. The driver
    /// is left enabled on success and disabled on failure.
    pub fn run<D, C, L>(
        &self,
        driver: &mut D,
        clock: &C,
        debouncer: &mut Debouncer,
        mut limit_raw: L,
    ) -> Result<HomingReport, HomingError>
    where
        D: StepperDriver,
        C: Clock,
        L: FnMut() -> bool,
    {
        debouncer.reset(InputId::Limit, clock.now_ms());
        driver.set_direction(Direction::CounterClockwise);
        driver.enable(true);

        // Sample before each pulse so a switch that is already closed still
        // has to hold for the press window
        let mut steps = 0;
        loop {
            if let Some(edge) = debouncer.sample(InputId::Limit, limit_raw(), clock.now_ms()) {
                return Ok(HomingReport {
                    steps,
                    at_ms: edge.at_ms,
                });
            }

            if steps >= self.config.max_steps {
                driver.enable(false);
                return Err(HomingError::LimitNotFound);
            }

            driver.step(self.config.half_period_us);
            steps += 1;
        }
    }
}
