//! Safety monitoring
//!
//! Driver fault latching and inactivity supervision.

pub mod latch;
pub mod supervisor;

pub use latch::FaultLatch;
pub use supervisor::{SafetyStatus, SafetySupervisor, DEFAULT_IDLE_TIMEOUT_MS};
