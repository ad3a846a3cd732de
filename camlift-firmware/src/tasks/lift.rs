//! Lift control task
//!
//! Homes the lift once, then runs the controller's poll loop forever. Moves
//! block this task for their full duration; the fault monitor and status
//! LED keep running on their own tasks.

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Delay, Duration, Instant, Ticker};
use portable_atomic::Ordering;

use camlift_core::traits::Clock;
use camlift_core::{Action, LiftController, LiftInputs, Rejection};
use camlift_drivers::opto::GpioOpto;
use camlift_drivers::stepper::Drv8825;

use crate::channels::{FAULT_LATCH, FAULT_LINE_HIGH, LIFT_STATUS};

/// Poll interval in milliseconds
pub const POLL_INTERVAL_MS: u64 = 1;

/// Controller wired to the board's pins
pub type Lift = LiftController<'static, Drv8825<Output<'static>, Delay>, GpioOpto<Output<'static>>>;

/// Input pins sampled every poll
pub struct LiftPins {
    pub enable: Input<'static>,
    pub direction: Input<'static>,
    pub limit: Input<'static>,
    pub left: Input<'static>,
    pub right: Input<'static>,
}

impl LiftPins {
    fn sample(&self) -> LiftInputs {
        LiftInputs {
            enable: self.enable.is_high(),
            direction: self.direction.is_high(),
            limit: self.limit.is_high(),
            left: self.left.is_high(),
            right: self.right.is_high(),
            fault_line: FAULT_LINE_HIGH.load(Ordering::Acquire),
        }
    }
}

/// Millisecond tick from the embassy time driver
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Lift task
#[embassy_executor::task]
pub async fn lift_task(mut lift: Lift, pins: LiftPins) {
    info!("Lift task started, homing");

    let clock = EmbassyClock;
    match lift.home(&clock, || pins.limit.is_high()) {
        Ok(report) => info!("Homed after {} steps", report.steps),
        Err(e) => {
            // Level is unknown; hold motion until the operator acknowledges
            error!("Homing failed: {:?}", e);
            FAULT_LATCH.raise();
        }
    }
    let mut last_status = lift.status();
    LIFT_STATUS.signal(last_status);

    // A held enable is refused on every poll while faulted
    let mut last_rejection: Option<Rejection> = None;

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    loop {
        let outcome = lift.poll(clock.now_ms(), pins.sample());

        if outcome.disabled {
            warn!("Driver disabled: {:?}", outcome.safety);
        }

        let rejection = match outcome.action {
            Some(Action::Rejected(reason)) => Some(reason),
            _ => None,
        };

        if let Some(action) = outcome.action {
            match action {
                Action::Moved { from, to, report } => info!(
                    "Moved {:?} -> {:?}: {} steps, opto at {}",
                    from, to, report.steps, report.fractional_at
                ),
                Action::Rejected(reason) => {
                    if last_rejection != Some(reason) {
                        warn!("Request rejected: {:?}", reason)
                    }
                }
                Action::Jogged { direction, offset } => {
                    info!("Jog {:?}, trim {}", direction, offset)
                }
                Action::PositionRecorded => info!("Position recorded"),
                Action::FaultAcknowledged => info!("Fault acknowledged"),
                Action::AcknowledgeRefused => warn!("Fault line still asserted"),
            }
        }

        last_rejection = rejection;

        let status = lift.status();
        if status != last_status {
            LIFT_STATUS.signal(status);
            last_status = status;
        }

        ticker.next().await;
    }
}
