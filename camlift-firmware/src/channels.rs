//! Inter-task communication
//!
//! Defines the statics shared between Embassy tasks. The fault path uses
//! plain atomics so it can be raised from any context; status updates go
//! through an embassy-sync signal.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use camlift_core::safety::FaultLatch;
use camlift_core::LiftStatus;

/// Driver fault latch (raised by the fault monitor, cleared on acknowledge)
pub static FAULT_LATCH: FaultLatch = FaultLatch::new();

/// Last level seen on the driver fault line
///
/// Starts high, which is the released level for the default active-low line.
pub static FAULT_LINE_HIGH: AtomicBool = AtomicBool::new(true);

/// Lift status for the status LED (updated by the lift task)
pub static LIFT_STATUS: Signal<CriticalSectionRawMutex, LiftStatus> = Signal::new();
