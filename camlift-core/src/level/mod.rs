//! Level tracking
//!
//! Open-loop position of the lift as one of four discrete levels.

pub mod machine;

pub use machine::{Level, LevelError, LevelMachine, PendingMove, Transition};
