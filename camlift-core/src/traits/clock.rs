//! Millisecond tick source

/// Free-running millisecond counter
///
/// The counter may wrap; consumers compare timestamps with wrapping
/// subtraction.
pub trait Clock {
    /// Milliseconds since boot
    fn now_ms(&self) -> u32;
}
