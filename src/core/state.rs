//! Rebuild state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of a run in the rebuild state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    /// Nothing has happened yet
    Idle,
    /// Invalidating the loaded artifact
    Unloading,
    /// Forcing the checkout to match the remote branch
    Pulling,
    /// Removing the build cache file
    CleaningCache,
    /// Running the build tool's configuration step
    Configuring,
    /// Compiling the target
    Building,
    /// Reloading the rebuilt artifact
    Loading,
    /// Artifact rebuilt and ready
    Ready,
    /// Run stopped early
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Ready | PipelineState::Failed)
    }

    /// The state that follows this one when the current step succeeds
    pub fn next(&self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Idle => Some(Unloading),
            Unloading => Some(Pulling),
            Pulling => Some(CleaningCache),
            CleaningCache => Some(Configuring),
            Configuring => Some(Building),
            Building => Some(Loading),
            Loading => Some(Ready),
            Ready | Failed => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Unloading => "unloading",
            PipelineState::Pulling => "pulling",
            PipelineState::CleaningCache => "cleaning-cache",
            PipelineState::Configuring => "configuring",
            PipelineState::Building => "building",
            PipelineState::Loading => "loading",
            PipelineState::Ready => "ready",
            PipelineState::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        use PipelineState::*;
        [Idle, Unloading, Pulling, CleaningCache, Configuring, Building, Loading, Ready, Failed]
            .into_iter()
            .find(|state| state.as_str() == value)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every step succeeded and the artifact is ready
    Completed,
    /// A declared step (pull, configure, build) failed
    AbortedOnStepFailure,
    /// Anything else went wrong (load failure, cache cleanup failure, ...)
    AbortedOnUnexpectedError,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::AbortedOnStepFailure => "step-failure",
            RunOutcome::AbortedOnUnexpectedError => "unexpected-error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [
            RunOutcome::Completed,
            RunOutcome::AbortedOnStepFailure,
            RunOutcome::AbortedOnUnexpectedError,
        ]
        .into_iter()
        .find(|outcome| outcome.as_str() == value)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one rebuild, handed back to the caller when the run ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Branch the checkout was synchronized to
    pub branch: String,

    /// Build target that was compiled
    pub target: String,

    /// Terminal state (`Ready` or `Failed`)
    pub state: PipelineState,

    pub outcome: RunOutcome,

    /// State the run was in when it failed
    pub failed_at: Option<PipelineState>,

    /// Message of the error that stopped the run
    pub error: Option<String>,

    /// Every progress entry, oldest first
    pub transcript: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
