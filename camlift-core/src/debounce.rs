//! Switch debouncing
//!
//! Filters the raw, active-low switch inputs (manual jog buttons and the
//! travel limit) into single press events. The release window is longer
//! than the press window: a switch that has been confirmed closed must stay
//! open for the longer window before it is considered released, so contact
//! chatter on release never produces a second press.

/// Default press-confirm window in milliseconds
pub const DEFAULT_PRESS_MS: u32 = 25;

/// Default release-confirm window in milliseconds
pub const DEFAULT_RELEASE_MS: u32 = 250;

/// Number of debounced inputs
pub const INPUT_COUNT: usize = 3;

/// Debounced switch inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputId {
    /// Manual jog button (raise)
    Left,
    /// Manual jog button (lower)
    Right,
    /// Travel limit switch at the bottom of the lift
    Limit,
}

impl InputId {
    /// All inputs, in state-table order
    pub const ALL: [InputId; INPUT_COUNT] = [InputId::Left, InputId::Right, InputId::Limit];

    const fn index(self) -> usize {
        match self {
            InputId::Left => 0,
            InputId::Right => 1,
            InputId::Limit => 2,
        }
    }
}

/// A confirmed press (high-to-low transition of an active-low input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FallingEdge {
    /// Input that was pressed
    pub id: InputId,
    /// Timestamp at which the press was confirmed
    pub at_ms: u32,
}

/// Press/release confirmation windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceTiming {
    /// Time the input must read active before a press is confirmed
    pub press_ms: u32,
    /// Time the input must read inactive before a release is confirmed
    pub release_ms: u32,
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self {
            press_ms: DEFAULT_PRESS_MS,
            release_ms: DEFAULT_RELEASE_MS,
        }
    }
}

/// Filter state of one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    /// Last confirmed level (true = high = inactive)
    pub stable: bool,
    /// Level seen on the previous sample
    pub last_raw: bool,
    /// Timestamp of the last raw change
    pub last_change_ms: u32,
}

impl ButtonState {
    /// Inactive (pulled-up) input
    pub const fn inactive() -> Self {
        Self {
            stable: true,
            last_raw: true,
            last_change_ms: 0,
        }
    }

    /// Check if the input is confirmed pressed
    pub fn is_pressed(&self) -> bool {
        !self.stable
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Debouncer for the lift's switch inputs
#[derive(Debug, Clone)]
pub struct Debouncer {
    timing: DebounceTiming,
    states: [ButtonState; INPUT_COUNT],
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DebounceTiming::default())
    }
}

impl Debouncer {
    /// Create a debouncer with all inputs inactive
    pub fn new(timing: DebounceTiming) -> Self {
        Self {
            timing,
            states: [ButtonState::inactive(); INPUT_COUNT],
        }
    }

    /// Feed one raw sample
    ///
    /// `raw` is the pin level (true = high). Returns a [`FallingEdge`] once
    /// per physical press, on the first sample after the input has read low
    /// for longer than the press window.
    pub fn sample(&mut self, id: InputId, raw: bool, now_ms: u32) -> Option<FallingEdge> {
        let state = &mut self.states[id.index()];

        if raw != state.last_raw {
            state.last_change_ms = now_ms;
        }
        state.last_raw = raw;

        let window = if state.stable {
            self.timing.press_ms
        } else {
            self.timing.release_ms
        };

        let settled = now_ms.wrapping_sub(state.last_change_ms) > window;
        if settled && raw != state.stable {
            state.stable = raw;
            if !raw {
                return Some(FallingEdge { id, at_ms: now_ms });
            }
        }

        None
    }

    /// Check if an input is confirmed pressed
    pub fn is_pressed(&self, id: InputId) -> bool {
        self.states[id.index()].is_pressed()
    }

    /// Get the filter state of an input
    pub fn state(&self, id: InputId) -> &ButtonState {
        &self.states[id.index()]
    }

    /// Get the configured windows
    pub fn timing(&self) -> DebounceTiming {
        self.timing
    }

    /// Return one input to the inactive state
    pub fn reset(&mut self, id: InputId, now_ms: u32) {
        self.states[id.index()] = ButtonState {
            last_change_ms: now_ms,
            ..ButtonState::inactive()
        };
    }
}
