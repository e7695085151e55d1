//! Rebuild configuration from YAML

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Branch synchronized when neither the file nor the command line names one
pub const DEFAULT_BRANCH: &str = "master";

/// Extra environment variables for the configuration step only
pub type BuildEnvironment = BTreeMap<String, String>;

/// Top-level rebuild configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildConfig {
    /// Path to the git checkout that gets rebuilt
    pub repository: PathBuf,

    /// Branch to synchronize with
    #[serde(default = "default_branch")]
    pub branch: String,

    pub artifact: ArtifactConfig,

    pub build: BuildSettings,

    /// Reload the previous artifact when a rebuild fails
    #[serde(default)]
    pub restore_on_failure: bool,

    /// Fail the run when the artifact is not ready after reloading
    #[serde(default)]
    pub require_ready: bool,
}

/// The artifact that is unloaded and reloaded around a rebuild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Name used in progress messages
    #[serde(default = "default_artifact_name")]
    pub name: String,

    /// Built file, relative to the repository unless absolute
    pub path: PathBuf,
}

/// Build tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Build tool executable
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Target passed to `--target`
    pub target: String,

    /// Cache file removed before configuring, relative to the repository
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Worker count for `--parallel` where the generator needs it
    #[serde(default = "default_parallel_jobs")]
    pub parallel_jobs: usize,

    /// Variables added to the environment of the configuration step
    #[serde(default)]
    pub env: BuildEnvironment,
}

/// Reject branch names git would misread
pub fn validate_branch(branch: &str) -> Result<()> {
    if branch.trim().is_empty() {
        anyhow::bail!("branch must not be empty");
    }
    if branch.starts_with('-') {
        anyhow::bail!("branch must not start with '-': '{}'", branch);
    }
    Ok(())
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_artifact_name() -> String {
    "artifact".to_string()
}

fn default_tool() -> String {
    "cmake".to_string()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("CMakeCache.txt")
}

fn default_parallel_jobs() -> usize {
    6
}

impl RebuildConfig {
    /// Load rebuild configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse rebuild configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RebuildConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the rebuild configuration
    pub fn validate(&self) -> Result<()> {
        if self.repository.as_os_str().is_empty() {
            anyhow::bail!("repository path must not be empty");
        }
        validate_branch(&self.branch)?;
        if self.build.tool.trim().is_empty() {
            anyhow::bail!("build.tool must not be empty");
        }
        if self.build.target.trim().is_empty() {
            anyhow::bail!("build.target must not be empty");
        }
        if self.build.parallel_jobs == 0 {
            anyhow::bail!("build.parallel_jobs must be greater than zero");
        }
        if self.artifact.path.as_os_str().is_empty() {
            anyhow::bail!("artifact.path must not be empty");
        }
        for key in self.build.env.keys() {
            if key.is_empty() || key.contains('=') {
                anyhow::bail!("Invalid build environment variable name: '{}'", key);
            }
        }
        Ok(())
    }

    /// Absolute location of the built artifact
    pub fn artifact_path(&self) -> PathBuf {
        self.repository.join(&self.artifact.path)
    }

    /// Absolute location of the build cache file
    pub fn cache_file_path(&self) -> PathBuf {
        self.repository.join(&self.build.cache_file)
    }
}
