//! Exclusive instance lock
//!
//! Two agents sharing one state file would race each other into
//! duplicate thread rotations, so the runner takes an advisory lock
//! next to the state file before doing anything else. The lock is held
//! for the life of the process and released by the OS even on a crash.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Held advisory lock. Dropping it releases the lock; the lock file
/// itself is left in place.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Lock file path for a given state file, `<state>.lock`.
    pub fn path_for(state_path: &Path) -> PathBuf {
        let mut raw = state_path.as_os_str().to_os_string();
        raw.push(".lock");
        PathBuf::from(raw)
    }

    /// Acquire the lock, failing fast if another process holds it.
    ///
    /// # Errors
    ///
    /// [`Error::InstanceAlreadyRunning`] when the lock is contended;
    /// I/O errors if the lock file cannot be created or written.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(error) if error.kind() == fs2::lock_contended_error().kind() => {
                return Err(Error::InstanceAlreadyRunning { path });
            }
            Err(error) => return Err(error.into()),
        }

        // Record the holder so a contended lock can be traced to a
        // process.
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        debug!(path = %path.display(), "instance lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "instance lock released");
    }
}
