//! Core types for sweepfile.
//!
//! This crate provides the data structures shared by the sweep engine, the
//! archive mover and the scheduler: configuration, filesystem nodes and the
//! age threshold used to decide what gets archived.

mod config;
mod error;
mod node;
mod threshold;

pub use config::{ArchiveLayout, SweepConfig, SweepConfigBuilder, keys, normalize_path};
pub use error::{ConfigError, SweepError};
pub use node::{FsNode, NodeKind};
pub use threshold::{Clock, DeletionThreshold, FixedClock, SystemClock};
