//! Hardware abstraction traits
//!
//! These traits define the interface between the lift logic and the
//! board-specific pin implementations.

pub mod clock;
pub mod opto;
pub mod stepper;

pub use clock::Clock;
pub use opto::{OptoOutput, OptoState};
pub use stepper::{Direction, Microsteps, StepperDriver};
