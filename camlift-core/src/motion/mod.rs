//! Motion generation
//!
//! Ramp planning, opto emulation and step execution for a single move.

pub mod distance;
pub mod executor;
pub mod opto;
pub mod ramp;
pub mod request;

pub use distance::{inches_to_steps, steps_to_inches};
pub use executor::{execute, run_plan, MoveReport};
pub use opto::{OptoEvent, OptoTrigger};
pub use ramp::{RampError, RampPhase, RampPlan, RampTable, StepPulse, StepRamp};
pub use request::MotionRequest;
