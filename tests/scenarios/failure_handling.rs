//! Test: Failure Handling - the pipeline stops at the first failure and
//! leaves the artifact unloaded

use crate::helpers::*;
use rebuilder::{ArtifactRuntime, PipelineState, RunOutcome};

#[tokio::test]
async fn test_fetch_failure() {
    let h = harness(HarnessOptions {
        fail_on: Some("git fetch --all"),
        with_cache_file: true,
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::AbortedOnStepFailure);
    assert_eq!(report.state, PipelineState::Failed);
    assert_eq!(report.failed_at, Some(PipelineState::Pulling));
    assert_transcript(
        &report,
        &[
            "Unloading VM...",
            "Pulling changes...",
            "Error: Command `git fetch --all` returned non-zero exit status 1",
        ],
    );
    assert_eq!(
        h.sink.last().as_deref(),
        Some("VM has NOT been rebuilt correctly!")
    );

    assert_eq!(
        h.journal.entries(),
        vec!["unload", "git reset --hard", "git fetch --all"]
    );
    assert!(!h.artifact.ready());
    // Later steps never ran
    assert!(h.repo.path().join("CMakeCache.txt").exists());
}

#[tokio::test]
async fn test_no_step_runs_after_a_failure() {
    for (i, failing) in FULL_COMMANDS.iter().enumerate() {
        let h = harness(HarnessOptions {
            fail_on: Some(*failing),
            ..Default::default()
        });

        let report = h.engine.rebuild(None).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::AbortedOnStepFailure, "{}", failing);
        let mut expected = vec!["unload".to_string()];
        expected.extend(FULL_COMMANDS[..=i].iter().map(|c| c.to_string()));
        assert_eq!(h.journal.entries(), expected, "failing on {}", failing);
        assert!(!h.artifact.ready(), "artifact reloaded after {} failed", failing);
        assert!(report
            .transcript
            .last()
            .unwrap()
            .starts_with(&format!("Error: Command `{}`", failing)));
    }
}

#[tokio::test]
async fn test_configure_failure_transcript() {
    let h = harness(HarnessOptions {
        fail_on: Some("cmake ."),
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.failed_at, Some(PipelineState::Configuring));
    assert_transcript(
        &report,
        &[
            "Unloading VM...",
            "Pulling changes...",
            "Deleting CMakeCache.txt",
            "Running configuration...",
            "Error: Command `cmake .` returned non-zero exit status 1",
        ],
    );
}

#[tokio::test]
async fn test_build_failure_keeps_artifact_unloaded() {
    let h = harness(HarnessOptions {
        fail_on: Some("cmake --build . --target libvm --parallel 6"),
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.failed_at, Some(PipelineState::Building));
    assert!(!report.transcript.iter().any(|s| s.starts_with("Loading")));
    assert!(!h.journal.entries().contains(&"load".to_string()));
    assert!(!h.artifact.ready());
}

#[tokio::test]
async fn test_load_failure_is_unexpected() {
    let h = harness(HarnessOptions {
        fail_load: true,
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::AbortedOnUnexpectedError);
    assert_eq!(report.failed_at, Some(PipelineState::Loading));
    assert_eq!(
        report.transcript.last().map(String::as_str),
        Some("Error: Artifact error: load failed")
    );
    assert_eq!(report.error.as_deref(), Some("Artifact error: load failed"));
    assert_eq!(
        h.sink.last().as_deref(),
        Some("VM has NOT been rebuilt correctly!")
    );
    assert!(!h.artifact.ready());
}

#[tokio::test]
async fn test_cache_cleanup_error_is_unexpected() {
    let h = harness(HarnessOptions::default());
    // A directory where the cache file should be cannot be removed as a file
    std::fs::create_dir(h.repo.path().join("CMakeCache.txt")).unwrap();

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::AbortedOnUnexpectedError);
    assert_eq!(report.failed_at, Some(PipelineState::CleaningCache));
    assert!(report.transcript.last().unwrap().starts_with("Error: IO error:"));
    assert!(!h.journal.entries().contains(&"cmake .".to_string()));
}

#[tokio::test]
async fn test_restore_previous_artifact_on_failure() {
    let h = harness(HarnessOptions {
        fail_on: Some("git fetch --all"),
        restore_on_failure: true,
        ..Default::default()
    });

    let report = h.engine.rebuild(None).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::AbortedOnStepFailure);
    assert_eq!(report.failed_at, Some(PipelineState::Pulling));
    assert_transcript(
        &report,
        &[
            "Unloading VM...",
            "Pulling changes...",
            "Error: Command `git fetch --all` returned non-zero exit status 1",
            "Restoring previous VM...",
            "Previous VM restored",
        ],
    );
    assert!(h.artifact.ready());
    assert_eq!(
        h.sink.last().as_deref(),
        Some("VM has NOT been rebuilt correctly!")
    );
}
