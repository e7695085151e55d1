//! Runs blocking steps off the async runtime and reports their progress

use crate::{
    core::{ProgressReport, RebuildError},
    notify::NotificationSink,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Hands blocking operations to a worker thread and keeps the observer up
/// to date while they run
#[derive(Clone)]
pub struct ExecutionBridge {
    sink: Arc<dyn NotificationSink>,
}

impl ExecutionBridge {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Append one state and publish the whole transcript
    pub async fn report(&self, progress: &mut ProgressReport, state: impl Into<String>) {
        progress.append(state);
        self.sink.publish(&progress.render()).await;
    }

    /// Publish a message without touching the transcript
    pub async fn announce(&self, text: &str) {
        self.sink.publish(text).await;
    }

    /// Run `operation` on a worker and report whether it succeeded.
    ///
    /// `label` is published before the operation starts. A failure is
    /// logged, appended as `Error: <message>` and published.
    pub async fn run<F>(&self, progress: &mut ProgressReport, label: &str, operation: F) -> bool
    where
        F: FnOnce() -> Result<(), RebuildError> + Send + 'static,
    {
        self.try_run(progress, label, operation).await.is_ok()
    }

    /// Same as [`run`](Self::run) but hands back the error
    pub async fn try_run<F>(
        &self,
        progress: &mut ProgressReport,
        label: &str,
        operation: F,
    ) -> Result<(), RebuildError>
    where
        F: FnOnce() -> Result<(), RebuildError> + Send + 'static,
    {
        self.report(progress, label).await;

        debug!("Dispatching '{}' to a blocking worker", label);
        let result = match tokio::task::spawn_blocking(operation).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(RebuildError::Worker(format!("'{}' panicked", label))),
            Err(e) => Err(RebuildError::Worker(e.to_string())),
        };

        if let Err(e) = &result {
            error!("'{}' failed: {:?}", label, e);
            self.report(progress, format!("Error: {}", e)).await;
        }

        result
    }
}
