//! Durable persistence for [`DynamicState`]
//!
//! State lives in a single JSON file. Saves go through a
//! write-to-temp-then-rename sequence with an fsync in between, so a
//! crash mid-save leaves either the old state or the new one on disk,
//! never a torn file. Updating this file is the commit point for a
//! thread rotation.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::DynamicState;

/// Handle to the on-disk state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state. A missing file is an empty state, not
    /// an error; the file appears on the first save.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, locked,
    /// or parsed as JSON.
    pub fn load(&self) -> Result<DynamicState> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(DynamicState::default());
            }
            Err(error) => return Err(error.into()),
        };
        file.lock_shared()?;

        // Read through the locked handle to avoid a TOCTOU race.
        let mut content = String::new();
        (&file).read_to_string(&mut content)?;

        serde_json::from_str(&content).map_err(|error| Error::Parse {
            path: self.path.clone(),
            message: error.to_string(),
        })
    }

    /// Persist `state`, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be written, synced, or
    /// renamed over the target.
    pub fn save(&self, state: &DynamicState) -> Result<()> {
        let content = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Temp file in the same directory, so the rename stays on one
        // filesystem.
        let temp_name = format!(
            ".{}.{}.tmp",
            self.path
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let temp_path = self.path.with_file_name(&temp_name);

        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        temp_file.lock_exclusive()?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.sync_all()?;
        fs2::FileExt::unlock(&temp_file)?;

        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
