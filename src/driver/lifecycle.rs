//! Launching and shutting down the target process

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use super::{Anchor, Driver, Session, Termination};
use crate::common::paths::Workspace;
use crate::common::{Error, Result};
use crate::input::InputSink;
use crate::locator::{keys, Locator, Match, Outcome};

impl<L: Locator, I: InputSink> Driver<L, I> {
    /// Launch the target and wait until its ready reference is on screen
    ///
    /// `launch_flags` go after the configured arguments. The returned anchor
    /// is the ready reference's region; relative clicks are measured from it.
    #[tracing::instrument(skip(self, workspace), fields(root = %workspace.root().display()))]
    pub async fn setup(
        &mut self,
        workspace: &Workspace,
        launch_flags: &[String],
    ) -> Result<(Session, Anchor)> {
        self.check_references([keys::READY])?;

        let program = resolve_program(&self.config.launch.program)?;
        let mut cmd = Command::new(&program);
        cmd.args(&self.config.launch.args)
            .args(launch_flags)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if workspace.root().is_dir() {
            cmd.current_dir(workspace.root());
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::LaunchFailure(format!("Failed to start {}: {}", program.display(), e))
        })?;
        tracing::info!(pid = ?child.id(), program = %program.display(), "Target launched");

        let locator = &self.locator;
        let waited = self
            .poll(self.config.timeouts.launch())
            .until(|| -> Result<Option<Match>> {
                if let Some(status) = child.try_wait()? {
                    return Err(Error::LaunchFailure(format!(
                        "{} exited with {} before becoming ready",
                        program.display(),
                        status
                    )));
                }
                Ok(locator.probe(keys::READY)?)
            })
            .await;

        match waited {
            Ok(Outcome::Ready(found)) => {
                let anchor = Anchor::new(keys::READY, found.region);
                tracing::info!(region = ?anchor.region, score = found.score, "Target ready");
                Ok((Session::new(child, anchor.clone()), anchor))
            }
            Ok(Outcome::Elapsed(waited)) => {
                tracing::warn!("Target not ready after {:?}, killing it", waited);
                let _ = child.kill().await;
                Err(Error::LaunchTimeout {
                    reference: keys::READY.to_string(),
                    waited_ms: waited.as_millis() as u64,
                })
            }
            Err(e) => {
                let _ = child.kill().await;
                Err(e)
            }
        }
    }

    /// Close the target, escalating to signals if it does not exit
    ///
    /// Always reaps the process, whatever state the session was left in.
    /// Input failures during the polite phase are logged, not returned.
    #[tracing::instrument(skip(self, session), fields(pid = ?session.pid()))]
    pub async fn quit(&mut self, mut session: Session) -> Result<Termination> {
        if let Ok(Some(status)) = session.child_mut().try_wait() {
            tracing::info!(%status, "Target had already exited");
            return Ok(Termination::Graceful(status));
        }

        if let Err(e) = self.input.press(&self.config.keys.quit) {
            tracing::warn!("Could not send quit shortcut: {}", e);
        }

        let grace = self.poll(self.config.timeouts.quit_grace());
        let locator = &self.locator;
        let input = &mut self.input;
        let confirm = &self.config.keys.quit_confirm;
        let child = session.child_mut();
        let mut answered = false;

        let polite = grace
            .until(|| -> std::result::Result<Option<ExitStatus>, Infallible> {
                match child.try_wait() {
                    Ok(Some(status)) => return Ok(Some(status)),
                    Ok(None) => {}
                    Err(e) => tracing::debug!("try_wait failed: {}", e),
                }
                if !answered && matches!(locator.probe(keys::QUIT_DIALOG), Ok(Some(_))) {
                    answered = true;
                    tracing::debug!("Answering quit dialog");
                    if let Err(e) = input.press(confirm) {
                        tracing::warn!("Could not answer quit dialog: {}", e);
                    }
                }
                Ok(None)
            })
            .await;

        let outcome = match polite {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        };

        if let Outcome::Ready(status) = outcome {
            tracing::info!(%status, "Target exited");
            return Ok(Termination::Graceful(status));
        }

        tracing::warn!("Target ignored quit request, terminating");
        let termination = terminate(session.child_mut(), self.config.timeouts.terminate()).await;
        tracing::info!(?termination, "Target stopped");
        Ok(termination)
    }
}

/// Use `program` as given if it has a directory part, else look it up on PATH
fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 {
        return Ok(program.to_path_buf());
    }
    which::which(program).map_err(|e| {
        Error::LaunchFailure(format!("'{}' not found on PATH: {}", program.display(), e))
    })
}

/// SIGTERM, wait, then SIGKILL
async fn terminate(child: &mut Child, wait: Duration) -> Termination {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: pid belongs to our child, which has not been reaped yet
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            if let Ok(Ok(status)) = tokio::time::timeout(wait, child.wait()).await {
                return Termination::Terminated(status);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = wait;

    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to kill target: {}", e);
    }
    Termination::Killed
}
