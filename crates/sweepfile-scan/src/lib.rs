//! Age-based traversal engine for sweepfile.
//!
//! A sweep walks every configured top-level folder depth-first. Each folder
//! and file is checked against the deletion threshold on its own; a folder
//! that qualifies is archived as a whole and its contents are not visited.

mod report;
mod sweeper;

pub use report::SweepReport;
pub use sweeper::Sweeper;
