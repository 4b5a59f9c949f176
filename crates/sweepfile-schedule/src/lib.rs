//! Cancellable sweep scheduler for sweepfile.
//!
//! The scheduler runs a sweep, waits for the configured number of days and
//! starts over. A failed sweep is logged and never stops the loop; only a
//! cancellation does, and it interrupts the wait right away.

mod scheduler;

pub use scheduler::Scheduler;
