//! Test utilities for rebuild scenarios

use async_trait::async_trait;
use rebuilder::process::CommandError;
use rebuilder::{
    ArtifactRuntime, CommandRunner, Invocation, NotificationSink, Os, RebuildConfig,
    RebuildEngine, RebuildError, RunReport,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Ordered record of everything that touched the outside world
#[derive(Default, Clone)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Command runner that records invocations and fails on chosen commands
pub struct ScriptedRunner {
    journal: Journal,
    invocations: Mutex<Vec<Invocation>>,
    fail_on: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedRunner {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            invocations: Mutex::new(Vec::new()),
            fail_on: None,
            delay: None,
        }
    }

    /// Exit with status 1 when `command_line` runs
    pub fn failing_on(mut self, command_line: &str) -> Self {
        self.fail_on = Some(command_line.to_string());
        self
    }

    /// Block for `delay` in every command
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let command = invocation.command_line();
        self.journal.record(command.clone());
        self.invocations.lock().unwrap().push(invocation.clone());

        if self.fail_on.as_deref() == Some(command.as_str()) {
            return Err(CommandError::Exit {
                command,
                code: Some(1),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

/// Sink that keeps every published message
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.published.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn publish(&self, text: &str) {
        self.published.lock().unwrap().push(text.to_string());
    }
}

/// Artifact runtime that journals unload/load calls
pub struct FakeArtifact {
    journal: Journal,
    loaded: AtomicBool,
    fail_load: bool,
}

impl FakeArtifact {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            loaded: AtomicBool::new(true),
            fail_load: false,
        }
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }
}

impl ArtifactRuntime for FakeArtifact {
    fn unload(&self) {
        self.journal.record("unload");
        self.loaded.store(false, Ordering::SeqCst);
    }

    fn load(&self) -> Result<(), RebuildError> {
        self.journal.record("load");
        if self.fail_load {
            return Err(RebuildError::Artifact("load failed".to_string()));
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn ready(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

/// Configuration pointing at `repository`
pub fn test_config(repository: &Path) -> RebuildConfig {
    let yaml = format!(
        r#"
repository: "{}"
artifact:
  name: VM
  path: libvm.so
build:
  target: libvm
  env:
    CC: clang
"#,
        repository.display()
    );
    RebuildConfig::from_yaml(&yaml).unwrap()
}

/// Everything a scenario needs to drive and inspect a rebuild
pub struct Harness {
    pub engine: RebuildEngine,
    pub runner: Arc<ScriptedRunner>,
    pub sink: Arc<RecordingSink>,
    pub artifact: Arc<FakeArtifact>,
    pub journal: Journal,
    pub repo: TempDir,
}

/// Options for building a [`Harness`]
#[derive(Default)]
pub struct HarnessOptions {
    pub fail_on: Option<&'static str>,
    pub fail_load: bool,
    pub with_cache_file: bool,
    pub restore_on_failure: bool,
    pub delay: Option<Duration>,
    pub platform: Option<Os>,
}

pub fn harness(options: HarnessOptions) -> Harness {
    let repo = tempfile::tempdir().unwrap();
    if options.with_cache_file {
        std::fs::write(repo.path().join("CMakeCache.txt"), "CMAKE_BUILD_TYPE:STRING=Release").unwrap();
    }

    let journal = Journal::default();
    let mut runner = ScriptedRunner::new(journal.clone());
    if let Some(command) = options.fail_on {
        runner = runner.failing_on(command);
    }
    if let Some(delay) = options.delay {
        runner = runner.with_delay(delay);
    }
    let runner = Arc::new(runner);

    let mut artifact = FakeArtifact::new(journal.clone());
    if options.fail_load {
        artifact = artifact.failing_load();
    }
    let artifact = Arc::new(artifact);

    let sink = Arc::new(RecordingSink::default());

    let mut config = test_config(repo.path());
    config.restore_on_failure = options.restore_on_failure;

    let engine = RebuildEngine::new(config, runner.clone(), artifact.clone(), sink.clone())
        .with_platform(options.platform.unwrap_or(Os::Linux));

    Harness {
        engine,
        runner,
        sink,
        artifact,
        journal,
        repo,
    }
}

/// Commands a full, successful rebuild of `master` issues on Linux
pub const FULL_COMMANDS: [&str; 7] = [
    "git reset --hard",
    "git fetch --all",
    "git checkout master",
    "git reset --hard origin/master",
    "git pull",
    "cmake .",
    "cmake --build . --target libvm --parallel 6",
];

/// Assert the transcript matches `expected` exactly
pub fn assert_transcript(report: &RunReport, expected: &[&str]) {
    let actual: Vec<&str> = report.transcript.iter().map(String::as_str).collect();
    assert_eq!(actual, expected, "unexpected transcript");
}
