//! Cross-process run lock keyed by pipeline identity

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, RunnerError};

/// Mutual-exclusion lock held for the duration of one pipeline run.
///
/// Acquisition creates `{lock_dir}/{pipeline_id}.lock` exclusively; a second
/// run attempt while the file exists is refused. The file is removed on
/// drop, so the lock is released on success, failure, and unwind alike.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(lock_dir: &Path, pipeline_id: &str) -> Result<Self> {
        fs::create_dir_all(lock_dir)?;
        let path = lock_dir.join(format!("{}.lock", pipeline_id));

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Record the holder for operators chasing a stale lock
                writeln!(file, "{}", std::process::id())?;
                info!("Acquired run lock at {:?}", path);
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(RunnerError::LockHeld(path.to_string_lossy().into_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove run lock {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let _held = RunLock::acquire(dir.path(), "pipeline").unwrap();

        let second = RunLock::acquire(dir.path(), "pipeline");
        assert!(matches!(second, Err(RunnerError::LockHeld(_))));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path;
        {
            let lock = RunLock::acquire(dir.path(), "pipeline").unwrap();
            path = lock.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());

        // Reacquire succeeds once the previous run is done
        assert!(RunLock::acquire(dir.path(), "pipeline").is_ok());
    }

    #[test]
    fn different_pipelines_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let _a = RunLock::acquire(dir.path(), "pipeline-a").unwrap();
        assert!(RunLock::acquire(dir.path(), "pipeline-b").is_ok());
    }
}
