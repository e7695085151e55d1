//! Error types for rebuild operations

use crate::process::CommandError;
use thiserror::Error;

/// Errors raised while rebuilding
#[derive(Debug, Error)]
pub enum RebuildError {
    /// A synchronization command exited non-zero or could not be spawned
    #[error("{0}")]
    VersionControl(CommandError),

    /// The build tool failed during configuration
    #[error("{0}")]
    BuildConfiguration(CommandError),

    /// The build tool failed while compiling the target
    #[error("{0}")]
    BuildCompile(CommandError),

    /// The artifact runtime refused to load or was not ready
    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker running a blocking operation died before returning
    #[error("Worker failed: {0}")]
    Worker(String),

    /// Another rebuild holds the single-flight guard
    #[error("A rebuild is already in progress")]
    AlreadyRunning,
}
