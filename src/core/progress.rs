//! Progress transcript shown to whoever triggered a rebuild

const FRAME: &str = "```";

/// Ordered, append-only log of human-readable states
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressReport {
    entries: Vec<String>,
}

impl ProgressReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next state. Returns `self` so calls can be chained.
    pub fn append(&mut self, state: impl Into<String>) -> &mut Self {
        self.entries.push(state.into());
        self
    }

    /// Render all entries, oldest first, inside a preformatted frame
    pub fn render(&self) -> String {
        format!("{FRAME}\n{}\n{FRAME}", self.entries.join("\n"))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
