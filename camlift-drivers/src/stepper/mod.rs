//! Stepper driver implementations

pub mod drv8825;

pub use drv8825::{Drv8825, Drv8825Config};
