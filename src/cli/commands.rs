//! CLI command definitions

use clap::Args;

const DEFAULT_CONFIG: &str = "rebuild.yaml";

/// Pull, rebuild and reload the artifact
#[derive(Debug, Args, Clone)]
pub struct RebuildCommand {
    /// Path to rebuild YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub file: String,

    /// Branch to synchronize with (overrides the configured branch)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Build target (overrides build.target)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a rebuild configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to rebuild YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Print the commands a rebuild would run
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to rebuild YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub file: String,

    /// Branch to synchronize with
    #[arg(short, long)]
    pub branch: Option<String>,
}

/// Show rebuild history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
