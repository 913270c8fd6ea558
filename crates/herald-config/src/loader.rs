//! Reading the static configuration from disk
//!
//! The file format is chosen by extension: `.toml` or `.json`. Both
//! deserialize into the same [`StaticConfig`] model.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{EXAMPLE_CONFIG, StaticConfig};

/// Load and parse the configuration at `path`.
///
/// # Errors
///
/// Distinguishes a missing file, an empty file, an unsupported
/// extension, and a parse failure; each carries the offending path.
pub fn load_static(path: &Path) -> Result<StaticConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(error) => return Err(error.into()),
    };
    if content.trim().is_empty() {
        return Err(Error::ConfigEmpty {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    let config = match extension.as_deref() {
        Some("toml") => toml::from_str(&content).map_err(|error| Error::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?,
        Some("json") => serde_json::from_str(&content).map_err(|error| Error::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?,
        _ => {
            return Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Write the commented example configuration to `path`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`Error::ConfigExists`] if the file is already present and
/// `force` is not set.
pub fn write_example(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::ConfigExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, EXAMPLE_CONFIG)?;
    Ok(())
}
