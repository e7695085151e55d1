//! Where rebuild progress is shown

use async_trait::async_trait;
use tracing::info;

/// Receives the rendered progress transcript and the final summary.
///
/// Each call replaces what the observer saw before, like editing a chat
/// message in place.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, text: &str);
}

/// Sends every update to the log
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn publish(&self, text: &str) {
        info!("{}", text);
    }
}
