//! Configuration types
//!
//! Tuned constants for one lift. Values are loaded once at boot; nothing
//! here is recalibrated at runtime.

use crate::debounce::DebounceTiming;
use crate::motion::{inches_to_steps, RampTable};
use crate::safety::DEFAULT_IDLE_TIMEOUT_MS;
use crate::traits::Microsteps;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Level spacing converts to zero steps
    ZeroLevelSpacing,
    /// Release window must be longer than the press window
    DebounceWindows,
    /// Idle timeout of zero would disable the driver on every poll
    ZeroIdleTimeout,
    /// Homing needs a step budget
    ZeroHomingSteps,
    /// A step half-period of zero
    ZeroHalfPeriod,
}

/// Motion parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Full motor steps per inch of lift travel
    pub steps_per_inch: f32,
    /// Travel between two adjacent levels (inches)
    pub level_spacing_in: f32,
    /// Microstep resolution for all moves
    pub microsteps: Microsteps,
    /// Acceleration table and slope
    pub ramp: RampTable,
    /// Delay between a direction change and the first step pulse (µs)
    pub direction_setup_us: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            steps_per_inch: 400.0,
            level_spacing_in: 2.5,
            microsteps: Microsteps::Full,
            ramp: RampTable::default(),
            direction_setup_us: 5,
        }
    }
}

/// Homing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingConfig {
    /// Step half-period while seeking the limit switch (µs)
    pub half_period_us: u32,
    /// Give up after this many steps without reaching the limit
    pub max_steps: u32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            half_period_us: 2000,
            max_steps: 20_000,
        }
    }
}

/// Safety parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SafetyConfig {
    /// Disable the driver after this long without motion (ms)
    pub idle_timeout_ms: u32,
    /// Driver fault line is active-low
    pub fault_active_low: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            fault_active_low: true,
        }
    }
}

/// Manual jog parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JogConfig {
    /// Full steps per button press
    pub steps: u32,
    /// Step half-period while jogging (µs)
    pub half_period_us: u32,
}

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            steps: 50,
            half_period_us: 1500,
        }
    }
}

/// Complete lift configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LiftConfig {
    pub debounce: DebounceTiming,
    pub motion: MotionConfig,
    pub homing: HomingConfig,
    pub safety: SafetyConfig,
    pub jog: JogConfig,
}

impl LiftConfig {
    /// Pulses per level change at the configured microstep resolution
    pub fn steps_per_level(&self) -> u32 {
        inches_to_steps(self.motion.level_spacing_in, self.motion.steps_per_inch)
            .saturating_mul(self.motion.microsteps.factor())
    }

    /// Pulses per jog press at the configured microstep resolution
    pub fn jog_steps(&self) -> u32 {
        self.jog
            .steps
            .saturating_mul(self.motion.microsteps.factor())
    }

    /// Check the values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_level() == 0 {
            return Err(ConfigError::ZeroLevelSpacing);
        }
        if self.debounce.press_ms >= self.debounce.release_ms {
            return Err(ConfigError::DebounceWindows);
        }
        if self.safety.idle_timeout_ms == 0 {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        if self.homing.max_steps == 0 {
            return Err(ConfigError::ZeroHomingSteps);
        }
        if self.homing.half_period_us == 0 || self.jog.half_period_us == 0 {
            return Err(ConfigError::ZeroHalfPeriod);
        }
        Ok(())
    }
}
