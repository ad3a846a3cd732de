//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in camlift-core on top of `embedded-hal` pins:
//!
//! - Stepper driver (DRV8825 step/dir with microstep mode pins)
//! - Emulated opto output

#![no_std]
#![deny(unsafe_code)]

pub mod opto;
pub mod stepper;

use core::convert::Infallible;
use embedded_hal::digital::{OutputPin, PinState};

/// Drive an infallible output pin
pub(crate) fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    match pin.set_state(PinState::from(high)) {
        Ok(()) => {}
        Err(e) => match e {},
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use core::convert::Infallible;
    use embedded_hal::delay::DelayNs;
    use embedded_hal::digital::{ErrorType, OutputPin};

    /// Mock GPIO pin for testing
    #[derive(Debug, Default)]
    pub struct MockPin {
        pub high: bool,
        /// Number of low-to-high transitions
        pub rises: u32,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            if !self.high {
                self.rises += 1;
            }
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
    }

    /// Delay that only adds up the requested time
    #[derive(Debug, Default)]
    pub struct MockDelay {
        pub total_ns: u64,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }
}
