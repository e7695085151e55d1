//! CLI output formatting

use crate::{
    core::RunOutcome,
    notify::NotificationSink,
    persistence::RunSummary,
};
use async_trait::async_trait;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

const FENCE: &str = "```";

/// Create a spinner for a running rebuild
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Inner lines of a rendered progress transcript, or `None` for plain text
pub fn transcript_lines(text: &str) -> Option<Vec<&str>> {
    let inner = text.strip_prefix(FENCE)?.strip_suffix(FENCE)?;
    Some(inner.trim_matches('\n').lines().collect())
}

/// Prints each new transcript line once and keeps a spinner on the
/// current state
pub struct TerminalSink {
    spinner: ProgressBar,
    shown: Mutex<usize>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            spinner: create_spinner(),
            shown: Mutex::new(0),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for TerminalSink {
    async fn publish(&self, text: &str) {
        let Some(lines) = transcript_lines(text) else {
            self.spinner.finish_and_clear();
            println!("{} {}", ROCKET, style(text).bold());
            return;
        };

        let mut shown = match self.shown.lock() {
            Ok(shown) => shown,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines.iter().skip(*shown) {
            self.spinner.println(format_state(line));
        }
        *shown = lines.len();

        if let Some(current) = lines.last() {
            self.spinner.set_message(current.to_string());
        }
    }
}

/// Format one transcript entry for display
pub fn format_state(state: &str) -> String {
    if let Some(message) = state.strip_prefix("Error: ") {
        format!("{} {}", CROSS, style(message).red())
    } else if state.ends_with('!') {
        format!("{} {}", CHECK, style(state).green())
    } else {
        format!("{} {}", SPINNER, state)
    }
}

/// Format a run outcome for display
pub fn format_outcome(outcome: RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed => style("COMPLETED").green().to_string(),
        RunOutcome::AbortedOnStepFailure => style("STEP FAILED").red().to_string(),
        RunOutcome::AbortedOnUnexpectedError => style("ERROR").red().to_string(),
    }
}

/// Format a history entry for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = if summary.outcome.is_success() { CHECK } else { CROSS };

    let mut line = format!(
        "{} {} - {} - {} @ {} - {}",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.artifact).bold(),
        style(&summary.target).cyan(),
        style(&summary.branch).cyan(),
        format_outcome(summary.outcome),
    );
    if let Some(failed_at) = summary.failed_at {
        line.push_str(&format!(" at {}", style(failed_at).yellow()));
    }
    line.push_str(&format!(
        " ({})",
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S")).dim()
    ));
    line
}

/// Format a duration as `1h 2m 3s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
