//! Driver fault monitoring task
//!
//! Waits on the DRV8825 nFAULT line and raises the fault latch whenever it
//! asserts. The lift loop picks the latch up on its next poll.

use defmt::*;
use embassy_rp::gpio::Input;
use portable_atomic::Ordering;

use crate::channels::{FAULT_LATCH, FAULT_LINE_HIGH};

/// Fault monitor task
///
/// A line that is already asserted at boot raises the latch immediately.
#[embassy_executor::task]
pub async fn fault_monitor_task(mut fault_pin: Input<'static>, active_low: bool) {
    info!("Fault monitor task started (active_low={})", active_low);

    loop {
        if active_low {
            fault_pin.wait_for_low().await;
        } else {
            fault_pin.wait_for_high().await;
        }
        FAULT_LINE_HIGH.store(!active_low, Ordering::Release);
        FAULT_LATCH.raise();
        warn!("Driver fault asserted");

        if active_low {
            fault_pin.wait_for_high().await;
        } else {
            fault_pin.wait_for_low().await;
        }
        FAULT_LINE_HIGH.store(active_low, Ordering::Release);
        info!("Driver fault line released");
    }
}
