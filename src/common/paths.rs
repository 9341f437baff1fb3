//! Workspace and configuration paths
//!
//! The workspace is where a test family keeps its reference images:
//! - `$SHAPE_DRIVER_HOME/tests` (home defaults to the current directory)
//! - or `$SHAPE_DRIVER_TEST_ROOT` when set
//!
//! with the editor tests under `<root>/editor`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Name used for config and data directories
const APP_NAME: &str = "shape-driver";

/// Environment variable naming the installation home
pub const HOME_VAR: &str = "SHAPE_DRIVER_HOME";

/// Environment variable overriding the test root
pub const TEST_ROOT_VAR: &str = "SHAPE_DRIVER_TEST_ROOT";

/// Root directory of one family of editor tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use an explicit directory as the workspace root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the workspace from `SHAPE_DRIVER_HOME` / `SHAPE_DRIVER_TEST_ROOT`
    pub fn from_env() -> Self {
        Self::resolve(std::env::var_os(HOME_VAR), std::env::var_os(TEST_ROOT_VAR))
    }

    /// Resolution rule behind [`Workspace::from_env`], without touching the environment
    pub fn resolve(home: Option<OsString>, test_root: Option<OsString>) -> Self {
        let base = match test_root {
            Some(root) => PathBuf::from(root),
            None => PathBuf::from(home.unwrap_or_else(|| OsString::from("."))).join("tests"),
        };
        Self {
            root: base.join("editor"),
        }
    }

    /// Workspace root (also the target's working directory)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding reference images keyed by UI element name
    pub fn references_dir(&self) -> PathBuf {
        self.root.join("references")
    }
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/shape-driver/`
/// - macOS: `~/Library/Application Support/shape-driver/`
/// - Windows: `%APPDATA%\shape-driver\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Ensure the log directory exists
pub fn ensure_log_dir() -> io::Result<Option<PathBuf>> {
    if let Some(dir) = log_dir() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}
