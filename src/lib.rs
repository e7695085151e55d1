//! rebuilder - resynchronize a checkout with its remote and rebuild a native artifact

pub mod artifact;
pub mod cli;
pub mod core;
pub mod execution;
pub mod notify;
pub mod persistence;
pub mod process;

// Re-export commonly used types
pub use artifact::{ArtifactFile, ArtifactRuntime};
pub use core::{PipelineState, ProgressReport, RebuildConfig, RebuildError, RunOutcome, RunReport};
pub use execution::{ExecutionBridge, RebuildEngine};
pub use notify::{LogSink, NotificationSink};
pub use process::{BuildInvoker, CommandRunner, GitSynchronizer, Invocation, Os, SystemRunner};
