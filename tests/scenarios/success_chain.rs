//! Test: Success Chain - every step succeeds and the artifact comes back

use crate::helpers::*;
use rebuilder::{ArtifactRuntime, Os, PipelineState, RunOutcome};

const FULL_TRANSCRIPT: [&str; 7] = [
    "Unloading VM...",
    "Pulling changes...",
    "Deleting CMakeCache.txt",
    "Running configuration...",
    "Building...",
    "Loading VM...",
    "VM is ready!",
];

#[tokio::test]
async fn test_full_rebuild() {
    let h = harness(HarnessOptions {
        with_cache_file: true,
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.state, PipelineState::Ready);
    assert!(report.failed_at.is_none());
    assert!(report.error.is_none());
    assert_eq!(report.branch, "master");
    assert_eq!(report.target, "libvm");
    assert_transcript(&report, &FULL_TRANSCRIPT);

    // Unload comes first, load last, commands in between
    let mut expected = vec!["unload".to_string()];
    expected.extend(FULL_COMMANDS.iter().map(|c| c.to_string()));
    expected.push("load".to_string());
    assert_eq!(h.journal.entries(), expected);

    assert!(h.artifact.ready());
    assert!(!h.repo.path().join("CMakeCache.txt").exists());
}

#[tokio::test]
async fn test_publishes_every_transition_then_summary() {
    let h = harness(HarnessOptions::default());

    h.engine.rebuild(None).await.unwrap();

    let published = h.sink.published();
    // One render per transcript entry plus the summary
    assert_eq!(published.len(), FULL_TRANSCRIPT.len() + 1);
    for (i, text) in published[..FULL_TRANSCRIPT.len()].iter().enumerate() {
        let expected = format!("```\n{}\n```", FULL_TRANSCRIPT[..=i].join("\n"));
        assert_eq!(text, &expected);
    }
    assert_eq!(h.sink.last().as_deref(), Some("VM has been rebuilt!"));
}

#[tokio::test]
async fn test_missing_cache_file_is_not_an_error() {
    let h = harness(HarnessOptions {
        with_cache_file: false,
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert!(report.is_success());
    assert!(report.transcript.iter().any(|s| s == "Deleting CMakeCache.txt"));
}

#[tokio::test]
async fn test_branch_override_with_explicit_remote() {
    let h = harness(HarnessOptions::default());

    let report = h.engine.rebuild(Some("fork/feature-x")).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.branch, "fork/feature-x");
    let journal = h.journal.entries();
    assert!(journal.contains(&"git checkout fork/feature-x".to_string()));
    assert!(journal.contains(&"git reset --hard fork/feature-x".to_string()));
    assert!(!journal.iter().any(|entry| entry.contains("origin/")));
}

#[tokio::test]
async fn test_no_parallel_hint_off_linux() {
    let h = harness(HarnessOptions {
        platform: Some(Os::Windows),
        ..Default::default()
    });

    h.engine.rebuild(None).await.unwrap();

    let journal = h.journal.entries();
    assert!(journal.contains(&"cmake --build . --target libvm".to_string()));
    assert!(!journal.iter().any(|entry| entry.contains("--parallel")));
}

#[tokio::test]
async fn test_build_env_only_on_configure() {
    let h = harness(HarnessOptions::default());

    h.engine.rebuild(None).await.unwrap();

    for invocation in h.runner.invocations() {
        assert_eq!(invocation.cwd, h.repo.path());
        if invocation.command_line() == "cmake ." {
            assert_eq!(invocation.env.get("CC").map(String::as_str), Some("clang"));
        } else {
            assert!(invocation.env.is_empty(), "{} got build env", invocation);
        }
    }
}
