//! Main execution engine - orchestrates a rebuild from unload to reload

use crate::{
    artifact::ArtifactRuntime,
    core::{
        BuildPhase, PipelineState, ProgressReport, RebuildConfig, RebuildError, RunOutcome,
        RunReport, Step, StepKind,
    },
    execution::ExecutionBridge,
    notify::NotificationSink,
    process::{BuildInvoker, CommandRunner, GitSynchronizer, Invocation, Os},
};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a run stopped early
enum Abort {
    /// A bridged step failed; the bridge already reported it
    Step(RebuildError),
    /// Anything else; reported at the engine boundary
    Unexpected(RebuildError),
}

impl From<RebuildError> for Abort {
    fn from(e: RebuildError) -> Self {
        Abort::Unexpected(e)
    }
}

/// One rebuild in progress
struct PipelineRun {
    id: Uuid,
    branch: String,
    state: PipelineState,
    progress: ProgressReport,
    started_at: DateTime<Utc>,
}

impl PipelineRun {
    fn new(branch: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            branch,
            state: PipelineState::Idle,
            progress: ProgressReport::new(),
            started_at: Utc::now(),
        }
    }

    fn finish(self, target: &str, outcome: RunOutcome, failure: Option<(PipelineState, String)>) -> RunReport {
        let (failed_at, error) = match failure {
            Some((state, message)) => (Some(state), Some(message)),
            None => (None, None),
        };
        RunReport {
            run_id: self.id,
            branch: self.branch,
            target: target.to_string(),
            state: self.state,
            outcome,
            failed_at,
            error,
            transcript: self.progress.entries().to_vec(),
            started_at: self.started_at,
            completed_at: Utc::now(),
        }
    }
}

/// Rebuild engine: unloads the artifact, synchronizes the checkout,
/// rebuilds, and reloads only when every step succeeded
pub struct RebuildEngine {
    config: Arc<RebuildConfig>,
    git: GitSynchronizer,
    builder: BuildInvoker,
    artifact: Arc<dyn ArtifactRuntime>,
    bridge: ExecutionBridge,
    in_flight: Mutex<()>,
}

impl RebuildEngine {
    pub fn new(
        config: RebuildConfig,
        runner: Arc<dyn CommandRunner>,
        artifact: Arc<dyn ArtifactRuntime>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let git = GitSynchronizer::new(runner.clone(), &config.repository);
        let builder = BuildInvoker::new(runner, &config.repository, config.build.clone());

        Self {
            config: Arc::new(config),
            git,
            builder,
            artifact,
            bridge: ExecutionBridge::new(sink),
            in_flight: Mutex::new(()),
        }
    }

    /// Build as if running on `platform`
    pub fn with_platform(mut self, platform: Os) -> Self {
        self.builder = self.builder.with_platform(platform);
        self
    }

    pub fn config(&self) -> &RebuildConfig {
        &self.config
    }

    /// External commands a rebuild of `branch` would run, in order
    pub fn plan(&self, branch: Option<&str>) -> Vec<Invocation> {
        let branch = branch.unwrap_or(self.config.branch.as_str());
        let mut commands = self.git.commands(branch);
        commands.push(self.builder.configure_command());
        commands.push(self.builder.build_command(&self.config.build.target));
        commands
    }

    /// Run the whole rebuild.
    ///
    /// Returns `Err(RebuildError::AlreadyRunning)` when another rebuild is in
    /// flight; every other failure ends up in the returned report.
    pub async fn rebuild(&self, branch: Option<&str>) -> Result<RunReport, RebuildError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            warn!("Rejected rebuild of {}: one is already running", self.config.artifact.name);
            RebuildError::AlreadyRunning
        })?;

        let name = self.config.artifact.name.clone();
        let mut run = PipelineRun::new(branch.unwrap_or(self.config.branch.as_str()).to_string());
        info!(run_id = %run.id, branch = %run.branch, "Starting rebuild of {}", name);

        let (outcome, failure) = match self.drive(&mut run).await {
            Ok(()) => (RunOutcome::Completed, None),
            Err(Abort::Step(e)) => (RunOutcome::AbortedOnStepFailure, Some(e)),
            Err(Abort::Unexpected(e)) => {
                error!("Rebuild of {} failed: {:?}", name, e);
                self.bridge
                    .report(&mut run.progress, format!("Error: {}", e))
                    .await;
                (RunOutcome::AbortedOnUnexpectedError, Some(e))
            }
        };

        let failure = match failure {
            None => {
                self.bridge
                    .announce(&format!("{} has been rebuilt!", name))
                    .await;
                None
            }
            Some(e) => {
                let failed_at = run.state;
                if self.config.restore_on_failure {
                    self.restore_previous(&mut run).await;
                }
                run.state = PipelineState::Failed;
                self.bridge
                    .announce(&format!("{} has NOT been rebuilt correctly!", name))
                    .await;
                Some((failed_at, e.to_string()))
            }
        };

        info!(run_id = %run.id, "Rebuild of {} finished: {}", name, outcome);
        Ok(run.finish(&self.config.build.target, outcome, failure))
    }

    /// Walk the step sequence, stopping at the first failure
    async fn drive(&self, run: &mut PipelineRun) -> Result<(), Abort> {
        let name = &self.config.artifact.name;
        let mut ready = false;

        for step in Step::sequence(&self.config, &run.branch) {
            run.state = step.state;
            debug!(state = %step.state, "Entering step");

            match step.kind {
                StepKind::InvalidateResource => {
                    self.bridge.report(&mut run.progress, step.label).await;
                    self.artifact.unload();
                }
                StepKind::RunShellSequence { branch } => {
                    let git = self.git.clone();
                    self.run_blocking(run, &step.label, move || git.synchronize(&branch))
                        .await?;
                }
                StepKind::DeleteFile(path) => {
                    self.bridge.report(&mut run.progress, step.label).await;
                    remove_if_present(&path).await?;
                }
                StepKind::InvokeBuildTool(BuildPhase::Configure) => {
                    let builder = self.builder.clone();
                    self.run_blocking(run, &step.label, move || builder.configure())
                        .await?;
                }
                StepKind::InvokeBuildTool(BuildPhase::Compile { target }) => {
                    let builder = self.builder.clone();
                    self.run_blocking(run, &step.label, move || builder.build(&target))
                        .await?;
                }
                StepKind::ReloadResource => {
                    self.bridge.report(&mut run.progress, step.label).await;
                    self.artifact.load()?;
                    ready = self.artifact.ready();
                    if !ready && self.config.require_ready {
                        return Err(RebuildError::Artifact(format!(
                            "{} did not become ready after loading",
                            name
                        ))
                        .into());
                    }
                }
            }
        }

        run.state = PipelineState::Ready;
        if ready {
            self.bridge
                .report(&mut run.progress, format!("{} is ready!", name))
                .await;
        } else {
            warn!("{} loaded but is not ready", name);
        }
        Ok(())
    }

    async fn run_blocking<F>(&self, run: &mut PipelineRun, label: &str, operation: F) -> Result<(), Abort>
    where
        F: FnOnce() -> Result<(), RebuildError> + Send + 'static,
    {
        self.bridge
            .try_run(&mut run.progress, label, operation)
            .await
            .map_err(Abort::Step)
    }

    /// Reload whatever artifact is on disk after a failed run
    async fn restore_previous(&self, run: &mut PipelineRun) {
        let name = &self.config.artifact.name;
        self.bridge
            .report(&mut run.progress, format!("Restoring previous {}...", name))
            .await;

        let state = match self.artifact.load() {
            Ok(()) if self.artifact.ready() => format!("Previous {} restored", name),
            Ok(()) => format!("Error: previous {} did not become ready", name),
            Err(e) => {
                error!("Could not restore previous {}: {:?}", name, e);
                format!("Error: {}", e)
            }
        };
        self.bridge.report(&mut run.progress, state).await;
    }
}

/// Delete `path`; a file that is already gone counts as deleted
async fn remove_if_present(path: &Path) -> Result<(), RebuildError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} was already absent", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
