//! Step domain model

use crate::core::{config::RebuildConfig, state::PipelineState};
use std::path::PathBuf;

/// Which half of the build tool a step runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildPhase {
    Configure,
    Compile { target: String },
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Make the loaded artifact unavailable
    InvalidateResource,
    /// Force the checkout to match a branch
    RunShellSequence { branch: String },
    /// Remove a file, tolerating its absence
    DeleteFile(PathBuf),
    /// Run the build tool
    InvokeBuildTool(BuildPhase),
    /// Load the artifact again
    ReloadResource,
}

impl StepKind {
    /// Whether the step goes through the execution bridge
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            StepKind::RunShellSequence { .. } | StepKind::InvokeBuildTool(_)
        )
    }
}

/// A single step in the rebuild pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State the pipeline is in while this step runs
    pub state: PipelineState,

    /// Progress label appended when the step starts
    pub label: String,

    pub kind: StepKind,
}

impl Step {
    fn new(state: PipelineState, label: impl Into<String>, kind: StepKind) -> Self {
        Self {
            state,
            label: label.into(),
            kind,
        }
    }

    /// The fixed rebuild sequence for a configuration and branch
    pub fn sequence(config: &RebuildConfig, branch: &str) -> Vec<Step> {
        let artifact = &config.artifact.name;
        vec![
            Step::new(
                PipelineState::Unloading,
                format!("Unloading {}...", artifact),
                StepKind::InvalidateResource,
            ),
            Step::new(
                PipelineState::Pulling,
                "Pulling changes...",
                StepKind::RunShellSequence {
                    branch: branch.to_string(),
                },
            ),
            Step::new(
                PipelineState::CleaningCache,
                format!("Deleting {}", config.build.cache_file.display()),
                StepKind::DeleteFile(config.cache_file_path()),
            ),
            Step::new(
                PipelineState::Configuring,
                "Running configuration...",
                StepKind::InvokeBuildTool(BuildPhase::Configure),
            ),
            Step::new(
                PipelineState::Building,
                "Building...",
                StepKind::InvokeBuildTool(BuildPhase::Compile {
                    target: config.build.target.clone(),
                }),
            ),
            Step::new(
                PipelineState::Loading,
                format!("Loading {}...", artifact),
                StepKind::ReloadResource,
            ),
        ]
    }
}
