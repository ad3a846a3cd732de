//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod fault;
pub mod lift;
pub mod status;

pub use fault::fault_monitor_task;
pub use lift::{lift_task, LiftPins};
pub use status::status_led_task;
