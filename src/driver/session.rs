//! One live run of the target application

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::Instant;

use super::history::HistoryLedger;
use crate::common::config::ModeKind;
use crate::common::{Error, Result};
use crate::geometry::{Point, Region};

/// A resolved on-screen region used as origin for relative actions
///
/// Keeps the reference key so the driver can re-resolve it before every
/// click; the cached region is only the last known position.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub key: String,
    pub region: Region,
}

impl Anchor {
    pub fn new(key: impl Into<String>, region: Region) -> Self {
        Self {
            key: key.into(),
            region,
        }
    }

    /// Absolute point at `(dx, dy)` from the cached region's origin
    pub fn point(&self, dx: i32, dy: i32) -> Point {
        self.region.offset(dx, dy)
    }
}

/// How `quit` ended the target process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own after the quit request
    Graceful(ExitStatus),
    /// Exited after SIGTERM
    Terminated(ExitStatus),
    /// Had to be killed
    Killed,
}

impl Termination {
    pub fn is_forced(&self) -> bool {
        !matches!(self, Self::Graceful(_))
    }
}

/// Mode the target is currently in, as far as the driver knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMode {
    pub name: String,
    pub kind: ModeKind,
}

/// Live target process plus what the driver has learned about its state
///
/// Created by `Driver::setup`, consumed by `Driver::quit`. Dropping a
/// session without quitting kills the process.
pub struct Session {
    child: Child,
    pid: Option<u32>,
    pub(super) anchor: Anchor,
    pub(super) mode: Option<ActiveMode>,
    pub(super) shape_type: Option<String>,
    pub(super) attributes_valid: bool,
    pub(super) history: HistoryLedger,
    started: Instant,
}

impl Session {
    pub(super) fn new(child: Child, anchor: Anchor) -> Self {
        let pid = child.id();
        Self {
            child,
            pid,
            anchor,
            mode: None,
            shape_type: None,
            attributes_valid: true,
            history: HistoryLedger::default(),
            started: Instant::now(),
        }
    }

    /// OS process id of the target
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Anchor matched at launch
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn mode(&self) -> Option<&ActiveMode> {
        self.mode.as_ref()
    }

    pub fn shape_type(&self) -> Option<&str> {
        self.shape_type.as_deref()
    }

    /// Whether the last attribute edit was accepted
    pub fn attributes_valid(&self) -> bool {
        self.attributes_valid
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail with `TargetExited` if the process is gone
    pub fn check_alive(&mut self) -> Result<()> {
        match self.child.try_wait()? {
            Some(status) => Err(Error::TargetExited(status.to_string())),
            None => Ok(()),
        }
    }

    pub(super) fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub(super) fn set_mode(&mut self, name: &str, kind: ModeKind) {
        self.mode = Some(ActiveMode {
            name: name.to_string(),
            kind,
        });
        self.shape_type = None;
    }

    pub(super) fn mode_kind(&self) -> ModeKind {
        self.mode.as_ref().map(|m| m.kind).unwrap_or_default()
    }

    /// Whether a canvas click is expected to create an element
    pub(super) fn click_creates(&self) -> bool {
        self.mode_kind() == ModeKind::Create && self.shape_type.is_some() && self.attributes_valid
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best-effort: quit() normally reaped the child already
        let _ = self.child.start_kill();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pid", &self.pid)
            .field("anchor", &self.anchor)
            .field("mode", &self.mode)
            .field("shape_type", &self.shape_type)
            .field("attributes_valid", &self.attributes_valid)
            .field("history", &self.history)
            .finish()
    }
}
