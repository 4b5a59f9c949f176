//! Archive operations for sweepfile.
//!
//! This crate moves aged files and folders into the archive root. Every
//! archive attempt first clears whatever entry already sits at the
//! destination, then moves the source in with replace-on-conflict semantics.
//! Failures never propagate: they are logged and recorded in the returned
//! [`ArchiveOutcome`].

mod archive;
mod move_op;
mod operation;
mod remove;

pub use archive::ArchiveMover;
pub use move_op::move_item;
pub use operation::{ArchiveOutcome, ArchiveStep, OperationError};
pub use remove::remove_entry;
