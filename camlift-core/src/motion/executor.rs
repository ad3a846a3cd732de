//! Move execution
//!
//! Runs a planned ramp on a stepper driver, blocking until the last pulse
//! has been emitted. The opto trigger rides along on the progress callback
//! and toggles the emulated opto line.

use super::opto::OptoTrigger;
use super::ramp::RampPlan;
use crate::traits::{OptoOutput, StepperDriver};

/// Outcome of an executed move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    /// Pulses emitted
    pub steps: u32,
    /// Pulse count at which the fractional opto toggle fired
    pub fractional_at: u32,
    /// Nominal move time (µs)
    pub duration_us: u64,
}

/// Emit every pulse of `plan`
///
/// Sets the direction once before the first pulse. `progress` is called
/// after each pulse with `(emitted, total)`. Returns the number of pulses
/// emitted.
pub fn run_plan<D, F>(driver: &mut D, plan: RampPlan<'_>, mut progress: F) -> u32
where
    D: StepperDriver,
    F: FnMut(u32, u32),
{
    let total = plan.total_steps();
    driver.set_direction(plan.direction());

    let mut emitted = 0;
    for pulse in plan {
        driver.step(pulse.half_period_us);
        emitted += 1;
        progress(emitted, total);
    }
    emitted
}

/// Execute a move and drive the emulated opto line
///
/// Toggles the opto output exactly twice: once when `fraction` percent of
/// the travel has been covered and once when the move completes.
pub fn execute<D, O>(driver: &mut D, opto: &mut O, plan: RampPlan<'_>, fraction: u8) -> MoveReport
where
    D: StepperDriver,
    O: OptoOutput,
{
    let total = plan.total_steps();
    let duration_us = plan.duration_us();
    let mut trigger = OptoTrigger::new(fraction, total);

    if trigger.arm().is_some() {
        opto.toggle();
    }

    let steps = run_plan(driver, plan, |emitted, total| {
        if trigger.on_progress(emitted, total).is_some() {
            opto.toggle();
        }
    });

    // Fractional toggle still owed on rounding, then the completion toggle
    let (fractional, completion) = trigger.complete();
    for _ in [fractional, completion].into_iter().flatten() {
        opto.toggle();
    }

    MoveReport {
        steps,
        fractional_at: trigger.fractional_at().unwrap_or(total),
        duration_us,
    }
}
