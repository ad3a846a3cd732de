//! Emulated opto sensor output

/// Level presented to the legacy controller on the opto line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OptoState {
    /// Light path clear (line low)
    #[default]
    Open,
    /// Light path interrupted by the cam (line high)
    Blocked,
}

impl OptoState {
    /// The other state
    pub fn toggled(self) -> Self {
        match self {
            OptoState::Open => OptoState::Blocked,
            OptoState::Blocked => OptoState::Open,
        }
    }
}

/// Output that stands in for the cam opto sensor
pub trait OptoOutput {
    /// Drive the line to a state
    fn set(&mut self, state: OptoState);

    /// Get the state currently driven
    fn state(&self) -> OptoState;

    /// Flip the line
    fn toggle(&mut self) {
        let next = self.state().toggled();
        self.set(next);
    }
}
