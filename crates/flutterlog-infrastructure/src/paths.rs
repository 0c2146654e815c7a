//! Unified path management for flutterlog files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/flutterlog/            # Config directory
//! └── config.toml                  # Application configuration
//!
//! ~/.local/share/flutterlog/       # Data directory
//! └── store/                       # FileKeyValueStore base directory
//!     └── history_<user>-<hash>.json
//! ```

use std::path::PathBuf;

const APP_DIR_NAME: &str = "flutterlog";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Platform path resolution for flutterlog.
///
/// Uses the `dirs` crate (XDG on Linux, Application Support on macOS,
/// AppData on Windows).
pub struct FlutterlogPaths;

impl FlutterlogPaths {
    /// Returns the flutterlog configuration directory (e.g. `~/.config/flutterlog/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the flutterlog data directory (e.g. `~/.local/share/flutterlog/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default base directory of the file-backed store.
    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store"))
    }
}
