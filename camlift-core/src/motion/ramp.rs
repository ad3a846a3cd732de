//! Table-driven step ramp generator
//!
//! A move is a trapezoidal speed profile built from a fixed table of pulse
//! half-periods. The table is walked forward to accelerate and backward to
//! decelerate; in between the motor cruises at the last (fastest) entry.
//! Each entry is held for `ceil(slope / half_period)` full steps, so every
//! entry lasts roughly the same time and the speed rises linearly.

use heapless::Vec;

use crate::traits::{Direction, Microsteps};

/// Maximum number of entries in a ramp table
pub const MAX_RAMP_ENTRIES: usize = 16;

/// Default acceleration table (half-period per full step, µs)
pub const DEFAULT_RAMP_TABLE_US: [u32; 12] =
    [2000, 1600, 1300, 1050, 850, 700, 580, 480, 400, 340, 290, 250];

/// Default slope factor (µs); each entry lasts about `2 * slope` µs
pub const DEFAULT_RAMP_SLOPE: u32 = 8000;

/// Errors building a ramp table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampError {
    /// No entries given
    Empty,
    /// More than [`MAX_RAMP_ENTRIES`] entries
    TooLong,
    /// A zero half-period
    ZeroInterval,
    /// Entries are not strictly decreasing
    NotDecreasing,
    /// Slope factor of zero
    ZeroSlope,
}

/// Phase of the speed profile a pulse belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampPhase {
    /// Speeding up along the table
    Accelerating,
    /// Flat run at the fastest entry
    Cruise,
    /// Slowing down along the reversed table
    Decelerating,
}

/// One step pulse of a planned move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepPulse {
    /// Zero-based pulse index within the move
    pub index: u32,
    /// Time the step line is held high, then low (µs)
    pub half_period_us: u32,
    /// Profile phase
    pub phase: RampPhase,
}

/// Validated acceleration table
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampTable {
    entries: Vec<u32, MAX_RAMP_ENTRIES>,
    slope: u32,
}

impl Default for RampTable {
    fn default() -> Self {
        let mut entries = Vec::new();
        for hp in DEFAULT_RAMP_TABLE_US {
            // Default table is shorter than MAX_RAMP_ENTRIES
            let _ = entries.push(hp);
        }
        Self {
            entries,
            slope: DEFAULT_RAMP_SLOPE,
        }
    }
}

impl RampTable {
    /// Build a table from half-periods (µs, strictly decreasing)
    pub fn new(half_periods_us: &[u32], slope: u32) -> Result<Self, RampError> {
        if half_periods_us.is_empty() {
            return Err(RampError::Empty);
        }
        if slope == 0 {
            return Err(RampError::ZeroSlope);
        }
        if half_periods_us.contains(&0) {
            return Err(RampError::ZeroInterval);
        }
        if half_periods_us.windows(2).any(|w| w[1] >= w[0]) {
            return Err(RampError::NotDecreasing);
        }

        let entries = Vec::from_slice(half_periods_us).map_err(|_| RampError::TooLong)?;
        Ok(Self { entries, slope })
    }

    /// Table entries (µs)
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Slope factor (µs)
    pub fn slope(&self) -> u32 {
        self.slope
    }

    /// Fastest (cruise) half-period at full-step resolution
    pub fn cruise_half_period_us(&self) -> u32 {
        self.entries.last().copied().unwrap_or(1)
    }

    /// Number of full steps entry `half_period_us` is held for
    fn hold_steps(&self, half_period_us: u32) -> u32 {
        self.slope.div_ceil(half_period_us).max(1)
    }

    /// Full steps needed to walk the whole table once
    ///
    /// Saturates for slopes far larger than any real move.
    pub fn accel_steps(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, &hp| acc.saturating_add(self.hold_steps(hp)))
    }
}

/// Step ramp generator
#[derive(Debug, Clone, Default)]
pub struct StepRamp {
    table: RampTable,
}

impl StepRamp {
    /// Create a generator over a table
    pub fn new(table: RampTable) -> Self {
        Self { table }
    }

    /// Get the table
    pub fn table(&self) -> &RampTable {
        &self.table
    }

    /// Plan a move of `total_steps` pulses
    ///
    /// `total_steps` is counted at the given microstep resolution. The
    /// direction is carried along for the executor; the ramp itself is
    /// direction-independent.
    pub fn generate(
        &self,
        direction: Direction,
        total_steps: u32,
        microsteps: Microsteps,
    ) -> RampPlan<'_> {
        RampPlan {
            table: &self.table,
            direction,
            factor: microsteps.factor(),
            total: total_steps,
            next: 0,
        }
    }
}

/// Pulse sequence of one move
///
/// Pulse `k` of `n` uses the slower of the acceleration interval at `k` and
/// at `n - 1 - k`. Long moves get a full ramp on both ends with a cruise in
/// between; short moves are cut symmetrically and never overshoot `n`.
#[derive(Debug, Clone)]
pub struct RampPlan<'a> {
    table: &'a RampTable,
    direction: Direction,
    factor: u32,
    total: u32,
    next: u32,
}

impl<'a> RampPlan<'a> {
    /// Direction of the move
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Total pulses in the move
    pub fn total_steps(&self) -> u32 {
        self.total
    }

    /// Pulses already yielded
    pub fn emitted(&self) -> u32 {
        self.next
    }

    /// Microsteps needed to walk the whole table once
    pub fn accel_steps(&self) -> u32 {
        self.table.accel_steps().saturating_mul(self.factor)
    }

    /// Cruise half-period at this plan's resolution (µs)
    pub fn cruise_half_period_us(&self) -> u32 {
        self.scale(self.table.cruise_half_period_us())
    }

    /// Whether the move is long enough for a cruise phase
    pub fn has_cruise(&self) -> bool {
        self.total > self.accel_steps().saturating_mul(2)
    }

    /// Total time of the remaining pulses (µs)
    pub fn duration_us(&self) -> u64 {
        self.clone().map(|p| 2 * p.half_period_us as u64).sum()
    }

    fn scale(&self, half_period_us: u32) -> u32 {
        (half_period_us / self.factor).max(1)
    }

    /// Acceleration-curve half-period `k` pulses from a standstill
    fn accel_half_period(&self, k: u32) -> u32 {
        let mut reached = 0u32;
        for &hp in self.table.entries() {
            reached = self
                .table
                .hold_steps(hp)
                .saturating_mul(self.factor)
                .saturating_add(reached);
            if k < reached {
                return self.scale(hp);
            }
        }
        self.cruise_half_period_us()
    }

    /// Pulse at index `k`
    pub fn pulse(&self, k: u32) -> Option<StepPulse> {
        if k >= self.total {
            return None;
        }

        let from_end = self.total - 1 - k;
        let accel_len = self.accel_steps();

        let phase = if k < accel_len && k <= from_end {
            RampPhase::Accelerating
        } else if from_end < accel_len {
            RampPhase::Decelerating
        } else {
            RampPhase::Cruise
        };

        let half_period_us = self
            .accel_half_period(k)
            .max(self.accel_half_period(from_end));

        Some(StepPulse {
            index: k,
            half_period_us,
            phase,
        })
    }
}

impl Iterator for RampPlan<'_> {
    type Item = StepPulse;

    fn next(&mut self) -> Option<StepPulse> {
        let pulse = self.pulse(self.next)?;
        self.next += 1;
        Some(pulse)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RampPlan<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp() -> StepRamp {
        StepRamp::default()
    }

    #[test]
    fn test_default_table_valid() {
        let table = RampTable::default();
        assert!(RampTable::new(table.entries(), table.slope()).is_ok());
        assert_eq!(table.accel_steps(), 181);
        assert_eq!(table.cruise_half_period_us(), 250);
    }

    #[test]
    fn test_table_validation() {
        assert_eq!(RampTable::new(&[], 100), Err(RampError::Empty));
        assert_eq!(RampTable::new(&[100], 0), Err(RampError::ZeroSlope));
        assert_eq!(RampTable::new(&[100, 0], 100), Err(RampError::ZeroInterval));
        assert_eq!(
            RampTable::new(&[100, 100], 100),
            Err(RampError::NotDecreasing)
        );
        assert_eq!(
            RampTable::new(&[100, 200], 100),
            Err(RampError::NotDecreasing)
        );
        let long: [u32; 17] = core::array::from_fn(|i| 1000 - i as u32);
        assert_eq!(RampTable::new(&long, 100), Err(RampError::TooLong));
    }

    #[test]
    fn test_slow_entries_held_for_fewer_steps() {
        let table = RampTable::new(&[1000, 500, 250], 1000).unwrap();
        assert_eq!(table.hold_steps(1000), 1);
        assert_eq!(table.hold_steps(500), 2);
        assert_eq!(table.hold_steps(250), 4);
        assert_eq!(table.accel_steps(), 7);
    }

    #[test]
    fn test_full_profile() {
        let table = RampTable::new(&[1000, 500, 250], 1000).unwrap();
        let ramp = StepRamp::new(table);
        let plan = ramp.generate(Direction::Clockwise, 20, Microsteps::Full);
        assert!(plan.has_cruise());

        let periods: std::vec::Vec<u32> = plan.clone().map(|p| p.half_period_us).collect();
        assert_eq!(
            periods,
            [
                1000, 500, 500, 250, 250, 250, 250, // accel
                250, 250, 250, 250, 250, 250, // cruise
                250, 250, 250, 250, 500, 500, 1000, // decel
            ]
        );

        let phases: std::vec::Vec<RampPhase> = plan.map(|p| p.phase).collect();
        assert_eq!(phases[0], RampPhase::Accelerating);
        assert_eq!(phases[6], RampPhase::Accelerating);
        assert_eq!(phases[7], RampPhase::Cruise);
        assert_eq!(phases[12], RampPhase::Cruise);
        assert_eq!(phases[13], RampPhase::Decelerating);
        assert_eq!(phases[19], RampPhase::Decelerating);
    }

    #[test]
    fn test_short_move_truncates_ramp() {
        let table = RampTable::new(&[1000, 500, 250], 1000).unwrap();
        let ramp = StepRamp::new(table);
        let plan = ramp.generate(Direction::CounterClockwise, 5, Microsteps::Full);
        assert!(!plan.has_cruise());

        let periods: std::vec::Vec<u32> = plan.map(|p| p.half_period_us).collect();
        assert_eq!(periods, [1000, 500, 500, 500, 1000]);
    }

    #[test]
    fn test_single_and_zero_step() {
        let ramp = ramp();
        let plan = ramp.generate(Direction::Clockwise, 1, Microsteps::Full);
        let pulses: std::vec::Vec<StepPulse> = plan.collect();
        assert_eq!(pulses.len(), 1);
        assert_eq!(pulses[0].half_period_us, 2000);

        let mut empty = ramp.generate(Direction::Clockwise, 0, Microsteps::Full);
        assert_eq!(empty.len(), 0);
        assert!(empty.next().is_none());
    }

    #[test]
    fn test_microsteps_scale_profile() {
        let table = RampTable::new(&[1000, 500, 250], 1000).unwrap();
        let ramp = StepRamp::new(table);
        let plan = ramp.generate(Direction::Clockwise, 200, Microsteps::Quarter);
        assert_eq!(plan.accel_steps(), 28);
        assert_eq!(plan.cruise_half_period_us(), 62);

        let first: std::vec::Vec<u32> = plan.clone().take(5).map(|p| p.half_period_us).collect();
        assert_eq!(first, [250, 250, 250, 250, 125]);
    }

    #[test]
    fn test_duration() {
        let table = RampTable::new(&[1000, 500, 250], 1000).unwrap();
        let ramp = StepRamp::new(table);
        let plan = ramp.generate(Direction::Clockwise, 5, Microsteps::Full);
        assert_eq!(plan.duration_us(), 2 * (1000 + 500 + 500 + 500 + 1000));
    }

    #[test]
    fn test_huge_slope_saturates() {
        let table = RampTable::new(&[2000, 1000], u32::MAX).unwrap();
        assert_eq!(table.accel_steps(), u32::MAX);

        let ramp = StepRamp::new(table);
        let plan = ramp.generate(Direction::Clockwise, 10, Microsteps::ThirtySecond);
        assert_eq!(plan.accel_steps(), u32::MAX);
        assert!(!plan.has_cruise());

        // Never gets past the first entry
        let periods: std::vec::Vec<u32> = plan.map(|p| p.half_period_us).collect();
        assert_eq!(periods, [62; 10]);
    }

    proptest! {
        #[test]
        fn prop_exact_count_and_monotonic(total in 1u32..3000, micro in 0usize..6) {
            let microsteps = [
                Microsteps::Full,
                Microsteps::Half,
                Microsteps::Quarter,
                Microsteps::Eighth,
                Microsteps::Sixteenth,
                Microsteps::ThirtySecond,
            ][micro];
            let ramp = StepRamp::default();
            let plan = ramp.generate(Direction::Clockwise, total, microsteps);
            let floor = plan.cruise_half_period_us();
            let pulses: std::vec::Vec<StepPulse> = plan.collect();

            prop_assert_eq!(pulses.len() as u32, total);

            for pair in pulses.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert_eq!(b.index, a.index + 1);
                if b.phase == RampPhase::Accelerating {
                    prop_assert!(b.half_period_us <= a.half_period_us);
                }
                if a.phase == RampPhase::Decelerating {
                    prop_assert!(b.half_period_us >= a.half_period_us);
                }
            }

            for p in &pulses {
                prop_assert!(p.half_period_us >= floor);
                if p.phase == RampPhase::Cruise {
                    prop_assert_eq!(p.half_period_us, floor);
                }
            }

            // Symmetric profile
            for (a, b) in pulses.iter().zip(pulses.iter().rev()) {
                prop_assert_eq!(a.half_period_us, b.half_period_us);
            }
        }
    }
}
