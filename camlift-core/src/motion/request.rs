//! Motion requests

use crate::traits::Direction;

/// One level change handed to the step generator
///
/// Built by the level state machine from its transition table and consumed
/// once by the move executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionRequest {
    /// Direction of travel
    pub direction: Direction,
    /// Pulses to emit, at the configured microstep resolution
    pub total_steps: u32,
    /// Percent of travel at which the opto line toggles (0-100)
    pub opto_trigger_fraction: u8,
}

impl MotionRequest {
    /// Create a request
    pub const fn new(direction: Direction, total_steps: u32, opto_trigger_fraction: u8) -> Self {
        Self {
            direction,
            total_steps,
            opto_trigger_fraction,
        }
    }

    /// Signed step delta of the move
    pub fn signed_steps(&self) -> i64 {
        self.total_steps as i64 * self.direction.sign() as i64
    }
}
