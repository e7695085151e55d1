//! Build tool invocation

use crate::core::config::BuildSettings;
use crate::core::RebuildError;
use crate::process::{CommandRunner, Invocation, Os};
use std::path::PathBuf;
use std::sync::Arc;

/// Configures and compiles a single target with the build tool
#[derive(Clone)]
pub struct BuildInvoker {
    runner: Arc<dyn CommandRunner>,
    repository: PathBuf,
    settings: BuildSettings,
    platform: Os,
}

impl BuildInvoker {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        repository: impl Into<PathBuf>,
        settings: BuildSettings,
    ) -> Self {
        Self {
            runner,
            repository: repository.into(),
            settings,
            platform: Os::current(),
        }
    }

    /// Pretend to run on another platform
    pub fn with_platform(mut self, platform: Os) -> Self {
        self.platform = platform;
        self
    }

    /// `<tool> .` with the build environment added
    pub fn configure_command(&self) -> Invocation {
        Invocation::new(&self.settings.tool, &self.repository)
            .arg(".")
            .envs(&self.settings.env)
    }

    /// `<tool> --build . --target <target>`, plus `--parallel` where needed
    pub fn build_command(&self, target: &str) -> Invocation {
        let command = Invocation::new(&self.settings.tool, &self.repository)
            .args(["--build", ".", "--target", target]);
        if self.platform.needs_parallel_hint() {
            command.args(["--parallel".to_string(), self.settings.parallel_jobs.to_string()])
        } else {
            command
        }
    }

    /// Run the configuration step
    pub fn configure(&self) -> Result<(), RebuildError> {
        self.runner
            .run(&self.configure_command())
            .map_err(RebuildError::BuildConfiguration)
    }

    /// Compile `target`
    pub fn build(&self, target: &str) -> Result<(), RebuildError> {
        self.runner
            .run(&self.build_command(target))
            .map_err(RebuildError::BuildCompile)
    }
}
