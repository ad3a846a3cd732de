//! Status LED task
//!
//! Slow heartbeat while healthy, fast blink while a driver fault is latched.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Timer};

use crate::channels::LIFT_STATUS;

/// Blink half-period while healthy
const HEARTBEAT: Duration = Duration::from_millis(500);

/// Blink half-period while faulted
const FAULT_BLINK: Duration = Duration::from_millis(100);

#[embassy_executor::task]
pub async fn status_led_task(mut led: Output<'static>) {
    info!("Status LED task started");

    let mut faulted = false;
    loop {
        let period = if faulted { FAULT_BLINK } else { HEARTBEAT };

        match select(LIFT_STATUS.wait(), Timer::after(period)).await {
            Either::First(status) => {
                if status.faulted != faulted {
                    debug!("Status: {:?}", status);
                }
                faulted = status.faulted;
            }
            Either::Second(()) => led.toggle(),
        }
    }
}
