// Data-directory lock — one pipeline run at a time.
//
// The lock is a file created with `create_new`, so two processes (a CLI run
// and the server, say) can't both hold it. It is removed when the guard drops,
// including on early return through `?`.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Guard for `.pipeline.lock`. Dropping it releases the lock.
#[derive(Debug)]
pub struct PipelineLock {
    path: PathBuf,
}

impl PipelineLock {
    /// Take the lock at `path`, or fail with `PipelineError::Busy`.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(PipelineError::Busy {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        };

        // Owner info for whoever finds a stale lock.
        if let Err(e) = writeln!(
            file,
            "pid={} started={}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        ) {
            warn!(path = %path.display(), error = %e, "Failed to write pipeline lock details");
        }

        debug!(path = %path.display(), "Acquired pipeline lock");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PipelineLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove pipeline lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::find_pipeline_error;

    #[test]
    fn test_second_acquire_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".pipeline.lock");

        let guard = PipelineLock::acquire(&path).unwrap();
        let err = PipelineLock::acquire(&path).unwrap_err();
        assert!(matches!(
            find_pipeline_error(&err),
            Some(PipelineError::Busy { .. })
        ));
        drop(guard);

        assert!(!path.exists());
        assert!(PipelineLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_lock_records_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".pipeline.lock");
        let _guard = PipelineLock::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(&format!("pid={} ", std::process::id())), "{contents}");
    }

    #[test]
    fn test_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".pipeline.lock");
        let guard = PipelineLock::acquire(&path).unwrap();
        assert!(guard.path().exists());
    }
}
