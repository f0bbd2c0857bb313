//! Filesystem collaborator.
//!
//! A narrow contract over the handful of filesystem operations the
//! orchestrator needs, so tests can substitute an in-memory double.

use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::{chown, User};
use tracing::debug;

use crate::error::{PhpupError, PhpupResult};

/// Filesystem operations used by the orchestrator.
pub trait Filesystem: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Read `path` as a UTF-8 string.
    fn get(&self, path: &Path) -> PhpupResult<String>;

    /// Write `content` to `path`, owned by `owner`.
    fn put_as_user(&self, path: &Path, content: &str, owner: &str) -> PhpupResult<()>;

    /// Remove the file at `path`.
    fn unlink(&self, path: &Path) -> PhpupResult<()>;

    /// Resolve the target of the symlink at `path`.
    fn read_link(&self, path: &Path) -> PhpupResult<PathBuf>;

    /// Create `path` (and parents) if missing, owned by `owner`.
    fn ensure_dir_exists(&self, path: &Path, owner: &str) -> PhpupResult<()>;
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone)]
pub struct RealFilesystem;

impl RealFilesystem {
    /// Create a new real filesystem.
    pub fn new() -> Self {
        Self
    }

    fn chown_to(&self, path: &Path, owner: &str) -> PhpupResult<()> {
        let user = User::from_name(owner)
            .map_err(|e| PhpupError::Config {
                message: format!("Failed to look up user '{}': {}", owner, e),
            })?
            .ok_or_else(|| PhpupError::Config {
                message: format!("Unknown user '{}'", owner),
            })?;

        chown(path, Some(user.uid), Some(user.gid)).map_err(|e| PhpupError::Config {
            message: format!("Failed to chown '{}' to '{}': {}", path.display(), owner, e),
        })
    }
}

impl Filesystem for RealFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get(&self, path: &Path) -> PhpupResult<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn put_as_user(&self, path: &Path, content: &str, owner: &str) -> PhpupResult<()> {
        debug!(path = %path.display(), owner = %owner, "Writing file");
        fs::write(path, content)?;
        self.chown_to(path, owner)
    }

    fn unlink(&self, path: &Path) -> PhpupResult<()> {
        debug!(path = %path.display(), "Removing file");
        fs::remove_file(path)?;
        Ok(())
    }

    fn read_link(&self, path: &Path) -> PhpupResult<PathBuf> {
        Ok(fs::read_link(path)?)
    }

    fn ensure_dir_exists(&self, path: &Path, owner: &str) -> PhpupResult<()> {
        if path.is_dir() {
            return Ok(());
        }
        debug!(path = %path.display(), owner = %owner, "Creating directory");
        fs::create_dir_all(path)?;
        self.chown_to(path, owner)
    }
}
