//! Opto emulation trigger
//!
//! The legacy controller watched an opto sensor on the mechanical cam. It
//! expects the opto line to change part-way through every level change and
//! again when the cam settles. The trigger watches step progress and fires
//! each of those two toggles exactly once per move.

/// Largest opto fraction (percent of travel)
pub const MAX_FRACTION: u8 = 100;

/// Toggle requested by the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OptoEvent {
    /// Travel passed the configured fraction
    Fractional {
        /// Pulses emitted when the toggle fired
        at_step: u32,
    },
    /// Move finished
    Completion,
}

/// Per-move opto trigger
#[derive(Debug, Clone)]
pub struct OptoTrigger {
    fraction: u8,
    total_steps: u32,
    fractional_at: Option<u32>,
    completed: bool,
}

impl OptoTrigger {
    /// Create a trigger for a move of `total_steps` pulses
    ///
    /// Fractions above 100 are clamped.
    pub fn new(fraction: u8, total_steps: u32) -> Self {
        Self {
            fraction: fraction.min(MAX_FRACTION),
            total_steps,
            fractional_at: None,
            completed: false,
        }
    }

    /// Configured fraction (percent)
    pub fn fraction(&self) -> u8 {
        self.fraction
    }

    /// Pulse count at which the fractional toggle fired
    pub fn fractional_at(&self) -> Option<u32> {
        self.fractional_at
    }

    /// Check if the completion toggle has fired
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Evaluate progress before the first pulse
    ///
    /// A 0% fraction fires here.
    pub fn arm(&mut self) -> Option<OptoEvent> {
        self.on_progress(0, self.total_steps)
    }

    /// Progress callback, invoked after each pulse
    pub fn on_progress(&mut self, emitted: u32, total: u32) -> Option<OptoEvent> {
        if self.fractional_at.is_some() || self.completed || total == 0 {
            return None;
        }

        // emitted * 100 / total >= fraction, without overflow
        let percent = emitted as u64 * 100 / total as u64;
        if percent >= self.fraction as u64 {
            self.fractional_at = Some(emitted);
            return Some(OptoEvent::Fractional { at_step: emitted });
        }

        None
    }

    /// Finish the move
    ///
    /// Returns the toggles still owed, in order: the fractional toggle if it
    /// never fired (rounding on very short moves), then the completion
    /// toggle. Returns nothing if the move was already completed.
    pub fn complete(&mut self) -> (Option<OptoEvent>, Option<OptoEvent>) {
        if self.completed {
            return (None, None);
        }

        let fractional = if self.fractional_at.is_none() {
            self.fractional_at = Some(self.total_steps);
            Some(OptoEvent::Fractional {
                at_step: self.total_steps,
            })
        } else {
            None
        };

        self.completed = true;
        (fractional, Some(OptoEvent::Completion))
    }
}
