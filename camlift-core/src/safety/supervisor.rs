//! Safety supervisor
//!
//! Decides when the stepper driver must be disabled: after a driver fault
//! and after a long stretch without any motion. It never enables the driver
//! itself; that only happens when the controller services a new move.

/// Default inactivity timeout in milliseconds
pub const DEFAULT_IDLE_TIMEOUT_MS: u32 = 60_000;

/// Result of a supervisor check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// Driver may stay enabled
    Ok,
    /// Driver fault latched; motion suspended until acknowledged
    Fault,
    /// No motion for longer than the idle timeout
    Idle,
}

impl SafetyStatus {
    /// Check if the driver must be disabled
    pub fn requires_disable(&self) -> bool {
        !matches!(self, SafetyStatus::Ok)
    }
}

/// Safety supervisor state
#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    /// Fault seen on the driver's fault line
    faulted: bool,
    /// Timestamp of the last serviced move
    last_active_ms: u32,
    /// Inactivity timeout
    idle_timeout_ms: u32,
}

impl SafetySupervisor {
    /// Create a supervisor; `now_ms` counts as the last activity
    pub fn new(idle_timeout_ms: u32, now_ms: u32) -> Self {
        Self {
            faulted: false,
            last_active_ms: now_ms,
            idle_timeout_ms,
        }
    }

    /// Copy the fault latch into the supervisor
    ///
    /// Only raises; a fault stays set until [`acknowledge_fault`](Self::acknowledge_fault).
    pub fn observe_fault(&mut self, latched: bool) {
        self.faulted |= latched;
    }

    /// Record that a move or jog was serviced
    pub fn note_activity(&mut self, now_ms: u32) {
        self.last_active_ms = now_ms;
    }

    /// Clear the fault
    ///
    /// Refused (returns false) while the fault line is still asserted.
    pub fn acknowledge_fault(&mut self, line_asserted: bool, now_ms: u32) -> bool {
        if line_asserted {
            return false;
        }
        self.faulted = false;
        self.last_active_ms = now_ms;
        true
    }

    /// Check if a fault is latched
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Milliseconds since the last serviced move
    pub fn idle_for(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_active_ms)
    }

    /// Check if motion may be started
    pub fn motion_allowed(&self) -> bool {
        !self.faulted
    }

    /// Evaluate both triggers
    pub fn check(&self, now_ms: u32) -> SafetyStatus {
        if self.faulted {
            return SafetyStatus::Fault;
        }

        if self.idle_for(now_ms) > self.idle_timeout_ms {
            return SafetyStatus::Idle;
        }

        SafetyStatus::Ok
    }
}
