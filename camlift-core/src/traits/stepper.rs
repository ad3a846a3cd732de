//! Stepper motor driver trait
//!
//! This trait abstracts over step/direction drivers with pin-selected
//! microstepping (DRV8825, A4988, etc.)

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise rotation (raises the lift)
    Clockwise,
    /// Counter-clockwise rotation (lowers the lift)
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Decode the legacy controller's direction line (high = clockwise)
    pub fn from_line(high: bool) -> Self {
        if high {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Signed unit for position bookkeeping
    pub fn sign(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// Microstep resolution selected through the driver's mode pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Microsteps {
    #[default]
    Full,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Microsteps {
    /// Microsteps per full step
    pub const fn factor(self) -> u32 {
        match self {
            Microsteps::Full => 1,
            Microsteps::Half => 2,
            Microsteps::Quarter => 4,
            Microsteps::Eighth => 8,
            Microsteps::Sixteenth => 16,
            Microsteps::ThirtySecond => 32,
        }
    }

    /// Look up a resolution by its factor (1, 2, 4 ... 32)
    pub fn from_factor(factor: u32) -> Option<Self> {
        match factor {
            1 => Some(Microsteps::Full),
            2 => Some(Microsteps::Half),
            4 => Some(Microsteps::Quarter),
            8 => Some(Microsteps::Eighth),
            16 => Some(Microsteps::Sixteenth),
            32 => Some(Microsteps::ThirtySecond),
            _ => None,
        }
    }

    /// Mode pin levels `[M0, M1, M2]`
    ///
    /// Follows the DRV8825 mode table.
    pub const fn mode_pins(self) -> [bool; 3] {
        match self {
            Microsteps::Full => [false, false, false],
            Microsteps::Half => [true, false, false],
            Microsteps::Quarter => [false, true, false],
            Microsteps::Eighth => [true, true, false],
            Microsteps::Sixteenth => [false, false, true],
            Microsteps::ThirtySecond => [true, false, true],
        }
    }
}

/// Trait for step/direction stepper drivers
///
/// All calls are blocking. `step` must not return before the full pulse
/// period (high and low half) has elapsed, so a caller iterating a ramp
/// gets the step rate the ramp asks for.
pub trait StepperDriver {
    /// Set the rotation direction
    ///
    /// Only called while no pulse is being emitted.
    fn set_direction(&mut self, dir: Direction);

    /// Get the current direction
    fn direction(&self) -> Direction;

    /// Select the microstep resolution
    fn set_microsteps(&mut self, microsteps: Microsteps);

    /// Enable or disable the motor outputs
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn enable(&mut self, enabled: bool);

    /// Check if the motor outputs are enabled
    fn is_enabled(&self) -> bool;

    /// Hold or release the driver's reset line
    fn set_reset(&mut self, asserted: bool);

    /// Emit one step pulse: high for `half_period_us`, then low for `half_period_us`
    fn step(&mut self, half_period_us: u32);
}
