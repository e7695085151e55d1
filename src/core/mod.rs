//! Core domain models for the rebuilder
//!
//! This module defines the configuration, the fixed step sequence, the
//! state machine and the progress transcript of a rebuild.

pub mod config;
pub mod error;
pub mod progress;
pub mod state;
pub mod step;

pub use config::{validate_branch, BuildEnvironment, RebuildConfig, DEFAULT_BRANCH};
pub use error::RebuildError;
pub use progress::ProgressReport;
pub use state::*;
pub use step::*;
