use anyhow::{Context, Result};
use rebuilder::cli::commands::{HistoryCommand, PlanCommand, RebuildCommand, ValidateCommand};
use rebuilder::cli::output::*;
use rebuilder::cli::{Cli, Command};
use rebuilder::core::validate_branch;
#[cfg(not(feature = "sqlite"))]
use rebuilder::persistence::InMemoryPersistence;
use rebuilder::persistence::{create_summary, PersistenceBackend};
use rebuilder::{ArtifactFile, ArtifactRuntime, RebuildConfig, RebuildEngine, SystemRunner};
use std::sync::Arc;
use tracing::{error, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Rebuild(cmd) => run_rebuild(cmd).await?,
        Command::Validate(cmd) => validate_config(cmd)?,
        Command::Plan(cmd) => show_plan(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

fn load_config(file: &str) -> Result<RebuildConfig> {
    RebuildConfig::from_file(file)
        .with_context(|| format!("Failed to load rebuild config from {}", file))
}

async fn open_history() -> Result<Arc<dyn PersistenceBackend>> {
    #[cfg(feature = "sqlite")]
    {
        let store = rebuilder::persistence::SqliteExecutionStore::with_default_path().await?;
        Ok(Arc::new(store))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Ok(Arc::new(InMemoryPersistence::new()))
    }
}

async fn run_rebuild(cmd: &RebuildCommand) -> Result<()> {
    let mut config = load_config(&cmd.file)?;
    if let Some(target) = &cmd.target {
        config.build.target = target.clone();
        config.validate()?;
    }
    if let Some(branch) = &cmd.branch {
        validate_branch(branch)?;
    }

    println!(
        "{} Rebuilding {} in {}",
        INFO,
        style(&config.artifact.name).bold(),
        style(config.repository.display()).dim()
    );

    let store = if cmd.no_history {
        None
    } else {
        Some(open_history().await?)
    };

    // Pick up the artifact from the last build so the rebuild has
    // something to unload
    let artifact = Arc::new(ArtifactFile::new(config.artifact_path()));
    if let Err(e) = artifact.load() {
        warn!("No existing artifact loaded: {}", e);
    }

    let name = config.artifact.name.clone();
    let engine = RebuildEngine::new(
        config,
        Arc::new(SystemRunner::new()),
        artifact,
        Arc::new(TerminalSink::new()),
    );

    let report = engine
        .rebuild(cmd.branch.as_deref())
        .await
        .context("Rebuild did not start")?;

    if let Some(store) = &store {
        store.save_run(&create_summary(&name, &report)).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&report.run_id.to_string()[..8]).dim()
        );
    }

    let elapsed = report
        .completed_at
        .signed_duration_since(report.started_at)
        .to_std()
        .unwrap_or_default();

    if report.is_success() {
        println!(
            "{} {} rebuilt from {} in {}",
            CHECK,
            style(&name).bold(),
            style(&report.branch).cyan(),
            format_duration(elapsed)
        );
    } else {
        println!(
            "{} {} {} ({})",
            CROSS,
            style(&name).bold(),
            style("failed").red(),
            format_outcome(report.outcome)
        );
        if let Some(e) = &report.error {
            error!("{}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating rebuild configuration...", INFO);

    match RebuildConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Rebuild configuration is valid!", CHECK);
            println!("  Repository: {}", style(config.repository.display()).bold());
            println!("  Branch: {}", style(&config.branch).cyan());
            println!("  Target: {}", style(&config.build.target).cyan());
            println!("  Artifact: {}", style(config.artifact_path().display()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn show_plan(cmd: &PlanCommand) -> Result<()> {
    let config = load_config(&cmd.file)?;
    let repository = config.repository.clone();
    let engine = RebuildEngine::new(
        config,
        Arc::new(SystemRunner::new()),
        Arc::new(ArtifactFile::new(repository.join("unused"))),
        Arc::new(rebuilder::LogSink),
    );

    println!("{} Commands run in {}:", INFO, style(repository.display()).dim());
    for invocation in engine.plan(cmd.branch.as_deref()) {
        if invocation.env.is_empty() {
            println!("  {}", style(invocation.command_line()).cyan());
        } else {
            let env: Vec<String> = invocation
                .env
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            println!(
                "  {} {}",
                style(env.join(" ")).dim(),
                style(invocation.command_line()).cyan()
            );
        }
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_history().await?;
    let runs = store.list_runs(cmd.limit).await?;

    if runs.is_empty() {
        println!("{} No rebuilds found", INFO);
        return Ok(());
    }

    if cmd.json {
        let data = serde_json::json!({ "rebuilds": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Rebuild history (showing latest {}):", INFO, cmd.limit);
    for run in &runs {
        println!("  {}", format_run_summary(run));
        if let Some(e) = &run.error {
            println!("      {} {}", WARN, style(e).dim());
        }
    }

    Ok(())
}
