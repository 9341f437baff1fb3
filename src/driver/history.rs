//! Undo/redo and save protocol
//!
//! The driver mirrors the target's undo stack in a [`HistoryLedger`] so it
//! can refuse an impossible `undo(n)` before sending a single key.

use super::{Driver, FrameState, Session};
use crate::common::{Error, Result};
use crate::input::InputSink;
use crate::locator::{keys, Locator, Outcome};

/// Depths of the target's undo and redo stacks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryLedger {
    undo: usize,
    redo: usize,
}

impl HistoryLedger {
    pub fn undo_depth(&self) -> usize {
        self.undo
    }

    pub fn redo_depth(&self) -> usize {
        self.redo
    }

    /// A new reversible edit; discards anything redoable
    pub fn record(&mut self) {
        self.undo += 1;
        self.redo = 0;
    }

    fn available(&self, action: HistoryAction) -> usize {
        match action {
            HistoryAction::Undo => self.undo,
            HistoryAction::Redo => self.redo,
        }
    }

    fn apply(&mut self, action: HistoryAction) {
        match action {
            HistoryAction::Undo => {
                self.undo -= 1;
                self.redo += 1;
            }
            HistoryAction::Redo => {
                self.redo -= 1;
                self.undo += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryAction {
    Undo,
    Redo,
}

impl HistoryAction {
    fn name(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// What a save command persists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Network,
    Shapes,
    Additionals,
}

impl SaveTarget {
    pub fn name(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Shapes => "shapes",
            Self::Additionals => "additionals",
        }
    }
}

impl<L: Locator, I: InputSink> Driver<L, I> {
    /// Undo `count` edits, one confirmed step at a time
    ///
    /// A step is confirmed by a change of the frame token or, without
    /// tokens, of the watch references' matches.
    #[tracing::instrument(skip(self, session))]
    pub async fn undo(&mut self, session: &mut Session, count: usize) -> Result<()> {
        self.step_history(session, HistoryAction::Undo, count).await
    }

    /// Redo `count` edits, one confirmed step at a time
    #[tracing::instrument(skip(self, session))]
    pub async fn redo(&mut self, session: &mut Session, count: usize) -> Result<()> {
        self.step_history(session, HistoryAction::Redo, count).await
    }

    async fn step_history(
        &mut self,
        session: &mut Session,
        action: HistoryAction,
        count: usize,
    ) -> Result<()> {
        session.check_alive()?;

        let available = session.history.available(action);
        if count > available {
            return Err(Error::HistoryExhausted {
                action: action.name(),
                requested: count,
                available,
            });
        }

        if count > 0 && self.capture()? == FrameState::Blind {
            return Err(Error::Config(format!(
                "Cannot confirm {} steps: the locator has no frame tokens and no watch references are configured",
                action.name()
            )));
        }

        let chord = match action {
            HistoryAction::Undo => self.config.keys.undo.clone(),
            HistoryAction::Redo => self.config.keys.redo.clone(),
        };
        let timeout = self.config.timeouts.history_step();

        for step in 1..=count {
            let before = self.capture()?;
            self.input.press(&chord)?;

            if !self.changed_since(session, &before, timeout).await? {
                return Err(Error::HistoryStepUnconfirmed {
                    action: action.name(),
                    step,
                    count,
                });
            }
            session.history.apply(action);
            tracing::debug!(step, count, ledger = ?session.history, "{} confirmed", action.name());
        }

        tracing::info!(
            count,
            undo_depth = session.history.undo_depth(),
            redo_depth = session.history.redo_depth(),
            "{} complete",
            action.name()
        );
        Ok(())
    }

    /// Trigger a save and wait for its confirmation indicator
    ///
    /// An indicator still showing from an earlier save does not count.
    #[tracing::instrument(skip(self, session), fields(target = target.name()))]
    pub async fn save(&mut self, session: &mut Session, target: SaveTarget) -> Result<()> {
        session.check_alive()?;

        let chord = match target {
            SaveTarget::Network => &self.config.keys.save_network,
            SaveTarget::Shapes => &self.config.keys.save_shapes,
            SaveTarget::Additionals => &self.config.keys.save_additionals,
        };
        let key = keys::saved(target.name());
        let indicators = [(key.as_str(), ())];
        let baseline = self.baseline(&indicators)?;
        self.input.press(chord)?;

        match self
            .wait_fresh(session, baseline, &indicators, self.config.timeouts.save())
            .await?
        {
            Outcome::Ready(_) => {
                tracing::info!("Saved {}", target.name());
                Ok(())
            }
            Outcome::Elapsed(waited) => Err(Error::SaveTimeout {
                what: target.name().to_string(),
                waited_ms: waited.as_millis() as u64,
            }),
        }
    }

    pub async fn save_shapes(&mut self, session: &mut Session) -> Result<()> {
        self.save(session, SaveTarget::Shapes).await
    }

    pub async fn save_network(&mut self, session: &mut Session) -> Result<()> {
        self.save(session, SaveTarget::Network).await
    }

    pub async fn save_additionals(&mut self, session: &mut Session) -> Result<()> {
        self.save(session, SaveTarget::Additionals).await
    }
}
