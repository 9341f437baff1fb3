//! Configuration file handling
//!
//! Every field has a default, so an empty (or missing) file describes a
//! stock editor installation on `PATH`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;
use crate::input::{Chord, Key, Modifier};
use crate::locator::keys;

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    /// How to start the target application
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Polling settings
    #[serde(default)]
    pub polling: Polling,

    /// Keyboard shortcuts of the target application
    #[serde(default)]
    pub keys: KeyBindings,

    /// Editing modes by name
    #[serde(default = "default_modes")]
    pub modes: HashMap<String, ModeBinding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            launch: LaunchConfig::default(),
            timeouts: Timeouts::default(),
            polling: Polling::default(),
            keys: KeyBindings::default(),
            modes: default_modes(),
        }
    }
}

/// Target application launch settings
#[derive(Debug, Deserialize, Clone)]
pub struct LaunchConfig {
    /// Program name (looked up on PATH) or path to the executable
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Arguments passed before the per-scenario launch flags
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("netedit")
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Launch until the ready reference matches
    #[serde(default = "default_launch")]
    pub launch_ms: u64,

    /// Any single "wait for element" inside an action
    #[serde(default = "default_match")]
    pub match_ms: u64,

    /// Field edit until valid/invalid indicator shows
    #[serde(default = "default_validation")]
    pub validation_ms: u64,

    /// Confirmation of one undo/redo step
    #[serde(default = "default_history_step")]
    pub history_step_ms: u64,

    /// Save until confirmation shows
    #[serde(default = "default_save")]
    pub save_ms: u64,

    /// Graceful quit before signals are sent
    #[serde(default = "default_quit_grace")]
    pub quit_grace_ms: u64,

    /// Wait after SIGTERM before killing
    #[serde(default = "default_terminate")]
    pub terminate_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            launch_ms: default_launch(),
            match_ms: default_match(),
            validation_ms: default_validation(),
            history_step_ms: default_history_step(),
            save_ms: default_save(),
            quit_grace_ms: default_quit_grace(),
            terminate_ms: default_terminate(),
        }
    }
}

fn default_launch() -> u64 {
    30_000
}
fn default_match() -> u64 {
    10_000
}
fn default_validation() -> u64 {
    3_000
}
fn default_history_step() -> u64 {
    5_000
}
fn default_save() -> u64 {
    20_000
}
fn default_quit_grace() -> u64 {
    5_000
}
fn default_terminate() -> u64 {
    2_000
}

impl Timeouts {
    pub fn launch(&self) -> Duration {
        Duration::from_millis(self.launch_ms)
    }
    pub fn matching(&self) -> Duration {
        Duration::from_millis(self.match_ms)
    }
    pub fn validation(&self) -> Duration {
        Duration::from_millis(self.validation_ms)
    }
    pub fn history_step(&self) -> Duration {
        Duration::from_millis(self.history_step_ms)
    }
    pub fn save(&self) -> Duration {
        Duration::from_millis(self.save_ms)
    }
    pub fn quit_grace(&self) -> Duration {
        Duration::from_millis(self.quit_grace_ms)
    }
    pub fn terminate(&self) -> Duration {
        Duration::from_millis(self.terminate_ms)
    }
}

/// Screen polling settings
#[derive(Debug, Deserialize, Clone)]
pub struct Polling {
    /// Delay between two match attempts
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// References compared before and after an input to tell whether the
    /// screen changed, for locators without frame tokens
    #[serde(default = "default_watch")]
    pub watch: Vec<String>,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            watch: default_watch(),
        }
    }
}

fn default_interval() -> u64 {
    100
}

fn default_watch() -> Vec<String> {
    vec![keys::CANVAS.to_string()]
}

impl Polling {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Keyboard shortcuts of the target application
#[derive(Debug, Deserialize, Clone)]
pub struct KeyBindings {
    #[serde(default = "default_undo")]
    pub undo: Chord,
    #[serde(default = "default_redo")]
    pub redo: Chord,
    /// Moves keyboard focus to the mode frame
    #[serde(default = "default_focus_frame")]
    pub focus_frame: Chord,
    /// Moves to the next field in the frame or dialog
    #[serde(default = "default_next_field")]
    pub next_field: Chord,
    #[serde(default = "default_select_all")]
    pub select_all: Chord,
    /// Commits a typed text field
    #[serde(default = "default_commit")]
    pub commit: Chord,
    /// Activates a button or checkbox
    #[serde(default = "default_toggle")]
    pub toggle: Chord,
    #[serde(default = "default_dialog_accept")]
    pub dialog_accept: Chord,
    /// Dismisses a dialog after its value was rejected
    #[serde(default = "default_dialog_cancel")]
    pub dialog_cancel: Chord,
    #[serde(default = "default_save_network")]
    pub save_network: Chord,
    #[serde(default = "default_save_shapes")]
    pub save_shapes: Chord,
    #[serde(default = "default_save_additionals")]
    pub save_additionals: Chord,
    /// Opens the viewport (zoom and center) dialog
    #[serde(default = "default_edit_viewport")]
    pub edit_viewport: Chord,
    #[serde(default = "default_quit")]
    pub quit: Chord,
    /// Answers the "quit without saving" dialog
    #[serde(default = "default_quit_confirm")]
    pub quit_confirm: Chord,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            undo: default_undo(),
            redo: default_redo(),
            focus_frame: default_focus_frame(),
            next_field: default_next_field(),
            select_all: default_select_all(),
            commit: default_commit(),
            toggle: default_toggle(),
            dialog_accept: default_dialog_accept(),
            dialog_cancel: default_dialog_cancel(),
            save_network: default_save_network(),
            save_shapes: default_save_shapes(),
            save_additionals: default_save_additionals(),
            edit_viewport: default_edit_viewport(),
            quit: default_quit(),
            quit_confirm: default_quit_confirm(),
        }
    }
}

fn default_undo() -> Chord {
    Chord::with(&[Modifier::Ctrl], Key::Char('z'))
}
fn default_redo() -> Chord {
    Chord::with(&[Modifier::Ctrl], Key::Char('y'))
}
fn default_focus_frame() -> Chord {
    Chord::key(Key::F(12))
}
fn default_next_field() -> Chord {
    Chord::key(Key::Tab)
}
fn default_select_all() -> Chord {
    Chord::with(&[Modifier::Ctrl], Key::Char('a'))
}
fn default_commit() -> Chord {
    Chord::key(Key::Enter)
}
fn default_toggle() -> Chord {
    Chord::key(Key::Space)
}
fn default_dialog_accept() -> Chord {
    Chord::key(Key::Enter)
}
fn default_dialog_cancel() -> Chord {
    Chord::key(Key::Escape)
}
fn default_save_network() -> Chord {
    Chord::with(&[Modifier::Ctrl], Key::Char('s'))
}
fn default_save_shapes() -> Chord {
    Chord::with(&[Modifier::Ctrl, Modifier::Shift], Key::Char('p'))
}
fn default_save_additionals() -> Chord {
    Chord::with(&[Modifier::Ctrl, Modifier::Shift], Key::Char('a'))
}
fn default_edit_viewport() -> Chord {
    Chord::with(&[Modifier::Ctrl], Key::Char('i'))
}
fn default_quit() -> Chord {
    Chord::with(&[Modifier::Ctrl], Key::Char('q'))
}
fn default_quit_confirm() -> Chord {
    Chord::with(&[Modifier::Alt], Key::Char('q'))
}

/// What clicks and attribute edits do in a mode
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    /// Clicks on the canvas create elements
    Create,
    /// Drags on the canvas move elements
    Move,
    /// Attribute edits apply to the inspected element
    Inspect,
    /// Clicks on the canvas remove elements
    Delete,
    /// Nothing the driver needs to track
    #[default]
    Other,
}

/// Key and behaviour of one editing mode
#[derive(Debug, Deserialize, Clone)]
pub struct ModeBinding {
    pub key: Chord,
    #[serde(default)]
    pub kind: ModeKind,
}

fn default_modes() -> HashMap<String, ModeBinding> {
    [
        ("shape", 'p', ModeKind::Create),
        ("additional", 'a', ModeKind::Create),
        ("move", 'm', ModeKind::Move),
        ("inspect", 'i', ModeKind::Inspect),
        ("delete", 'd', ModeKind::Delete),
        ("select", 's', ModeKind::Other),
    ]
    .into_iter()
    .map(|(name, key, kind)| {
        (
            name.to_string(),
            ModeBinding {
                key: Chord::key(Key::Char(key)),
                kind,
            },
        )
    })
    .collect()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Get a mode binding by name
    pub fn mode(&self, name: &str) -> Option<&ModeBinding> {
        self.modes.get(name)
    }
}
