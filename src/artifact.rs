//! The artifact that is unloaded before and reloaded after a rebuild

use crate::core::RebuildError;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::{debug, info};

/// Runtime holding the built artifact
pub trait ArtifactRuntime: Send + Sync {
    /// Make the artifact unavailable. Must not fail.
    fn unload(&self);

    /// Load the artifact from its build location
    fn load(&self) -> Result<(), RebuildError>;

    /// Whether the artifact is loaded and usable
    fn ready(&self) -> bool;
}

/// What was on disk when the artifact was loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSnapshot {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Treats a built file as the artifact: loading checks it is present and
/// records its metadata.
#[derive(Debug)]
pub struct ArtifactFile {
    path: PathBuf,
    loaded: Mutex<Option<ArtifactSnapshot>>,
}

impl ArtifactFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> Option<ArtifactSnapshot> {
        self.loaded.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ArtifactRuntime for ArtifactFile {
    fn unload(&self) {
        if let Ok(mut loaded) = self.loaded.lock() {
            if loaded.take().is_some() {
                info!("Unloaded {}", self.path.display());
            }
        }
    }

    fn load(&self) -> Result<(), RebuildError> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            RebuildError::Artifact(format!("cannot load {}: {}", self.path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(RebuildError::Artifact(format!(
                "{} is not a file",
                self.path.display()
            )));
        }

        let snapshot = ArtifactSnapshot {
            size: metadata.len(),
            modified: metadata.modified().ok(),
        };
        debug!("Loaded {} ({} bytes)", self.path.display(), snapshot.size);

        let mut loaded = self
            .loaded
            .lock()
            .map_err(|_| RebuildError::Artifact("artifact state poisoned".to_string()))?;
        *loaded = Some(snapshot);
        Ok(())
    }

    fn ready(&self) -> bool {
        self.snapshot().is_some()
    }
}
