//! Level state machine
//!
//! The lift has four positions that a mechanical cam used to cycle through. A
//! clockwise request walks `Down -> MidRight -> Up -> MidLeft -> Down`,
//! counter-clockwise walks the same ring backwards. Every transition moves
//! one level spacing; where the opto flips during that travel depends on the
//! shape of the cam and differs per transition and per direction.

use crate::motion::MotionRequest;
use crate::traits::Direction;

/// Lift positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Bottom position, defined by homing
    #[default]
    Down,
    /// Half-way, reached clockwise from Down
    MidRight,
    /// Top position
    Up,
    /// Half-way, reached clockwise from Up
    MidLeft,
}

impl Level {
    /// All levels in clockwise order
    pub const ALL: [Level; 4] = [Level::Down, Level::MidRight, Level::Up, Level::MidLeft];

    const fn index(self) -> usize {
        match self {
            Level::Down => 0,
            Level::MidRight => 1,
            Level::Up => 2,
            Level::MidLeft => 3,
        }
    }

    /// Table entry for a transition from this level
    pub fn transition(self, direction: Direction) -> Transition {
        let row = &TRANSITIONS[self.index()];
        match direction {
            Direction::Clockwise => row.clockwise,
            Direction::CounterClockwise => row.counter_clockwise,
        }
    }

    /// Level reached by one move in `direction`
    pub fn next(self, direction: Direction) -> Level {
        self.transition(direction).next
    }
}

/// One entry of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    /// Level after the move
    pub next: Level,
    /// Percent of travel at which the cam would have flipped the opto
    pub opto_fraction: u8,
}

const fn t(next: Level, opto_fraction: u8) -> Transition {
    Transition {
        next,
        opto_fraction,
    }
}

struct Row {
    clockwise: Transition,
    counter_clockwise: Transition,
}

/// Transition table, indexed by current level
///
/// Opto fractions are measured on the mechanical cam.
const TRANSITIONS: [Row; 4] = [
    // Down
    Row {
        clockwise: t(Level::MidRight, 33),
        counter_clockwise: t(Level::MidLeft, 40),
    },
    // MidRight
    Row {
        clockwise: t(Level::Up, 50),
        counter_clockwise: t(Level::Down, 67),
    },
    // Up
    Row {
        clockwise: t(Level::MidLeft, 25),
        counter_clockwise: t(Level::MidRight, 50),
    },
    // MidLeft
    Row {
        clockwise: t(Level::Down, 60),
        counter_clockwise: t(Level::Up, 75),
    },
];

/// Level state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LevelError {
    /// A move is already executing; the request is rejected, not queued
    MoveInProgress,
    /// No move is in flight to finish
    NoMoveInFlight,
}

/// A started move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingMove {
    /// Request for the step generator
    pub request: MotionRequest,
    /// Level the lift will be at once the move finishes
    pub target: Level,
}

/// Tracks the current level and the move in flight
#[derive(Debug, Clone)]
pub struct LevelMachine {
    current: Level,
    steps_per_level: u32,
    in_flight: Option<PendingMove>,
}

impl LevelMachine {
    /// Create a machine at `Down`
    pub fn new(steps_per_level: u32) -> Self {
        Self {
            current: Level::Down,
            steps_per_level,
            in_flight: None,
        }
    }

    /// Current level
    pub fn current(&self) -> Level {
        self.current
    }

    /// Steps per level spacing
    pub fn steps_per_level(&self) -> u32 {
        self.steps_per_level
    }

    /// Check if a move is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Move in flight, if any
    pub fn in_flight(&self) -> Option<&PendingMove> {
        self.in_flight.as_ref()
    }

    /// Define the current position as `Down` (after homing)
    pub fn home(&mut self) {
        self.current = Level::Down;
        self.in_flight = None;
    }

    /// Start a level change
    ///
    /// Returns the motion request for the step generator. The level does
    /// not change until [`finish`](Self::finish) is called.
    pub fn begin(&mut self, direction: Direction) -> Result<PendingMove, LevelError> {
        if self.in_flight.is_some() {
            return Err(LevelError::MoveInProgress);
        }

        let transition = self.current.transition(direction);
        let pending = PendingMove {
            request: MotionRequest::new(direction, self.steps_per_level, transition.opto_fraction),
            target: transition.next,
        };
        self.in_flight = Some(pending);
        Ok(pending)
    }

    /// Commit the move in flight and return the new level
    pub fn finish(&mut self) -> Result<Level, LevelError> {
        let pending = self.in_flight.take().ok_or(LevelError::NoMoveInFlight)?;
        self.current = pending.target;
        Ok(self.current)
    }
}
