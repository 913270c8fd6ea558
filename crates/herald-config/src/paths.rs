//! Platform default locations for the configuration and state files

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "herald";

/// Default configuration path, `<config_dir>/herald/config.toml`.
///
/// # Errors
///
/// Returns [`Error::DefaultPathUnavailable`] when the platform exposes
/// no user configuration directory.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.toml"))
        .ok_or(Error::DefaultPathUnavailable {
            what: "configuration",
        })
}

/// Default state path, `<data_local_dir>/herald/state.json`.
///
/// # Errors
///
/// Returns [`Error::DefaultPathUnavailable`] when the platform exposes
/// no local data directory.
pub fn default_state_path() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR).join("state.json"))
        .ok_or(Error::DefaultPathUnavailable { what: "state" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_end_with_app_files() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("herald/config.toml"));
        }
        if let Ok(path) = default_state_path() {
            assert!(path.ends_with("herald/state.json"));
        }
    }
}
