//! Board-agnostic core logic for the cam lift firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper driver, opto output, clock)
//! - Switch debouncing
//! - Step ramp generation and the emulated opto trigger
//! - Level state machine and homing
//! - Safety supervision
//! - The control loop and configuration parsing

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod controller;
pub mod debounce;
pub mod homing;
pub mod level;
pub mod motion;
pub mod safety;
pub mod traits;

#[cfg(test)]
mod mock;

pub use controller::{Action, LiftController, LiftInputs, LiftStatus, PollOutcome, Rejection};
