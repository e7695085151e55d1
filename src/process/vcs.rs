//! Git synchronization - forces a checkout to match a remote branch

use crate::core::RebuildError;
use crate::process::{CommandRunner, Invocation};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_REMOTE: &str = "origin";

/// The remote-tracking ref a branch is reset to.
///
/// A branch without a `/` is taken from `origin`; one that already names a
/// remote (`fork/feature-x`) is used as is.
pub fn remote_tracking_ref(branch: &str) -> String {
    if branch.contains('/') {
        branch.to_string()
    } else {
        format!("{}/{}", DEFAULT_REMOTE, branch)
    }
}

/// Discards local changes and moves a checkout to the tip of a remote branch
#[derive(Clone)]
pub struct GitSynchronizer {
    runner: Arc<dyn CommandRunner>,
    repository: PathBuf,
}

impl GitSynchronizer {
    pub fn new(runner: Arc<dyn CommandRunner>, repository: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repository: repository.into(),
        }
    }

    /// Commands issued by [`synchronize`](Self::synchronize), in order
    pub fn commands(&self, branch: &str) -> Vec<Invocation> {
        let remote = remote_tracking_ref(branch);
        let git = |args: &[&str]| Invocation::new("git", &self.repository).args(args.iter().copied());
        vec![
            git(&["reset", "--hard"]),
            git(&["fetch", "--all"]),
            git(&["checkout", branch]),
            git(&["reset", "--hard", remote.as_str()]),
            git(&["pull"]),
        ]
    }

    /// Force the checkout to match `branch` on its remote.
    ///
    /// Local modifications and local commits are discarded. The first
    /// command that fails stops the sequence.
    pub fn synchronize(&self, branch: &str) -> Result<(), RebuildError> {
        info!(
            "Synchronizing {} with {}",
            self.repository.display(),
            remote_tracking_ref(branch)
        );
        for command in self.commands(branch) {
            self.runner
                .run(&command)
                .map_err(RebuildError::VersionControl)?;
        }
        Ok(())
    }
}
