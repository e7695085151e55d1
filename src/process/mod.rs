//! External processes driven by a rebuild: git and the build tool

pub mod build;
pub mod platform;
pub mod runner;
pub mod vcs;

pub use build::BuildInvoker;
pub use platform::Os;
pub use runner::{CommandError, CommandRunner, Invocation, SystemRunner};
pub use vcs::{remote_tracking_ref, GitSynchronizer};
