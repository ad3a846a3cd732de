//! Driver fault latch
//!
//! Set from the fault-line handler, read by the control loop. One writer
//! raises, one reader observes; only single-word loads and stores are used
//! so the latch works on cores without compare-and-swap.

use portable_atomic::{AtomicBool, Ordering};

/// Sticky fault flag, usable from a `static`
#[derive(Debug)]
pub struct FaultLatch {
    raised: AtomicBool,
}

impl Default for FaultLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultLatch {
    /// Create a cleared latch
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Record a fault
    ///
    /// Repeated faults before the loop observes the first one coalesce.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Check whether a fault has been recorded
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Clear the latch after the fault has been acknowledged
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }
}
