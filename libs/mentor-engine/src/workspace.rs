/// Workspace Manager - Per-Run Isolated Build Directories
///
/// **Core Responsibility:**
/// Allocate a private, uniquely named directory for one verification run and
/// guarantee teardown on every exit path.
///
/// **Critical Properties:**
/// - One workspace per run, never shared between concurrent runs
/// - `release()` is idempotent and safe to call multiple times
/// - Drop is the cleanup backstop, so a panic anywhere in the run still
///   removes the directory
/// - Cleanup failure is logged, never propagated as a user-facing error
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Allocate a fresh workspace directory under the configured root.
    ///
    /// This is the one infrastructure operation whose failure propagates out
    /// of the engine facade: if the directory cannot be created there is no
    /// run to report on.
    pub fn acquire(&self) -> Result<Workspace> {
        let dir = self.root.join(format!("mentor-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create workspace at {}", dir.display()))?;
        debug!(workspace = %dir.display(), "Workspace acquired");
        Ok(Workspace {
            dir,
            released: false,
        })
    }
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

pub struct Workspace {
    dir: PathBuf,
    released: bool,
}

impl Workspace {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the workspace directory. Idempotent; best-effort.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!(workspace = %self.dir.display(), error = %e, "Failed to release workspace");
        } else {
            debug!(workspace = %self.dir.display(), "Workspace released");
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_unique_directories() {
        let manager = WorkspaceManager::default();
        let a = manager.acquire().unwrap();
        let b = manager.acquire().unwrap();

        assert!(a.dir().is_dir());
        assert!(b.dir().is_dir());
        assert_ne!(a.dir(), b.dir());
    }

    #[test]
    fn release_removes_directory_and_is_idempotent() {
        let manager = WorkspaceManager::default();
        let mut ws = manager.acquire().unwrap();
        let path = ws.dir().to_path_buf();
        fs::write(path.join("submission.rs"), "pub fn f() {}").unwrap();

        ws.release();
        assert!(!path.exists());

        // Second release is a no-op, not an error.
        ws.release();
    }

    #[test]
    fn drop_releases_workspace() {
        let manager = WorkspaceManager::default();
        let path;
        {
            let ws = manager.acquire().unwrap();
            path = ws.dir().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
