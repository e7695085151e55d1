//! Persistence layer for rebuild history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteExecutionStore;

use crate::core::{PipelineState, RunOutcome, RunReport};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of one rebuild. The progress transcript is not kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Name of the rebuilt artifact
    pub artifact: String,

    pub branch: String,

    pub target: String,

    pub outcome: RunOutcome,

    /// State the run failed in, if it failed
    pub failed_at: Option<PipelineState>,

    /// Error message that stopped the run
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a finished run
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// Most recent runs first, at most `limit`
    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPersistence {
    runs: tokio::sync::RwLock<Vec<RunSummary>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.retain(|existing| existing.run_id != run.run_id);
        runs.push(run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let runs = self.runs.read().await;
        Ok(runs.iter().find(|run| run.run_id == run_id).cloned())
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let mut runs = self.runs.read().await.clone();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);
        Ok(runs)
    }
}

/// Create a summary from a finished run
pub fn create_summary(artifact: &str, report: &RunReport) -> RunSummary {
    RunSummary {
        run_id: report.run_id,
        artifact: artifact.to_string(),
        branch: report.branch.clone(),
        target: report.target.clone(),
        outcome: report.outcome,
        failed_at: report.failed_at,
        error: report.error.clone(),
        started_at: report.started_at,
        completed_at: report.completed_at,
    }
}
