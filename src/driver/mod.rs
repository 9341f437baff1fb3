//! Automation driver for the network editor
//!
//! A [`Driver`] turns high-level test actions ("enter shape mode", "click
//! here", "undo twice") into keystrokes and mouse events, then waits for the
//! screen to confirm each one. It owns the locator and the input sink; the
//! target process itself lives in a [`Session`] returned by
//! [`Driver::setup`].
//!
//! Every action is awaited to completion before the next one starts. Waits
//! are bounded by the timeouts in [`Config`].

mod actions;
mod history;
mod lifecycle;
mod session;

pub use actions::{DialogHandle, DialogValue, FieldEdit};
pub use history::{HistoryLedger, SaveTarget};
pub use session::{ActiveMode, Anchor, Session, Termination};

use std::time::Duration;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::input::InputSink;
use crate::locator::{Locator, Match, Outcome, Poll, ReferenceStore};

/// Drives one target application through a locator and an input sink
pub struct Driver<L, I> {
    config: Config,
    locator: L,
    input: I,
    references: Option<ReferenceStore>,
}

impl<L: Locator, I: InputSink> Driver<L, I> {
    pub fn new(config: Config, locator: L, input: I) -> Self {
        Self {
            config,
            locator,
            input,
            references: None,
        }
    }

    /// Check reference keys against this store before touching the target
    pub fn with_references(mut self, store: ReferenceStore) -> Self {
        self.references = Some(store);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Fail with a `Config` error if any key has no reference image
    ///
    /// Without an attached store every key passes.
    pub fn check_references<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let Some(store) = &self.references else {
            return Ok(());
        };
        let missing = store.missing(keys);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "No reference image for {} in {}",
                missing.join(", "),
                store.dir().display()
            )))
        }
    }

    fn poll(&self, timeout: Duration) -> Poll {
        Poll::new(self.config.polling.interval(), timeout)
    }

    /// Wait for `key` to be on screen while the target stays alive
    async fn wait_for(
        &self,
        session: &mut Session,
        key: &str,
        timeout: Duration,
    ) -> Result<Outcome<Match>> {
        let locator = &self.locator;
        self.poll(timeout)
            .until(|| -> Result<Option<Match>> {
                session.check_alive()?;
                Ok(locator.probe(key)?)
            })
            .await
    }

    /// Wait until `key` is no longer on screen
    async fn wait_gone(
        &self,
        session: &mut Session,
        key: &str,
        timeout: Duration,
    ) -> Result<Outcome<()>> {
        let locator = &self.locator;
        self.poll(timeout)
            .until(|| -> Result<Option<()>> {
                session.check_alive()?;
                Ok(locator.probe(key)?.is_none().then_some(()))
            })
            .await
    }

    /// Like `wait_for`, but a timeout is `TargetNotReady`
    async fn require(&self, session: &mut Session, key: &str) -> Result<Match> {
        match self
            .wait_for(session, key, self.config.timeouts.matching())
            .await?
        {
            Outcome::Ready(found) => Ok(found),
            Outcome::Elapsed(waited) => Err(Error::not_ready(key, waited)),
        }
    }
}

/// What the driver could see of the whole screen just before an input
#[derive(Debug, Clone, PartialEq)]
enum FrameState {
    /// The locator's frame token
    Token(u64),
    /// Matches of the configured watch references, in order
    Watched(Vec<Option<Match>>),
    /// Nothing to compare against
    Blind,
}

/// Indicators that were already showing before an input
#[derive(Debug)]
struct Baseline {
    token: Option<u64>,
    stale: Vec<bool>,
}

impl<L: Locator, I: InputSink> Driver<L, I> {
    fn capture(&self) -> Result<FrameState> {
        if let Some(token) = self.locator.frame_token() {
            return Ok(FrameState::Token(token));
        }
        if self.config.polling.watch.is_empty() {
            return Ok(FrameState::Blind);
        }
        Ok(FrameState::Watched(self.watched()?))
    }

    fn watched(&self) -> Result<Vec<Option<Match>>> {
        self.config
            .polling
            .watch
            .iter()
            .map(|key| Ok(self.locator.probe(key)?))
            .collect()
    }

    /// Whether the screen differs from `before`; `None` if it cannot tell
    fn frame_differs(&self, before: &FrameState) -> Result<Option<bool>> {
        Ok(match before {
            FrameState::Token(token) => Some(self.locator.frame_token() != Some(*token)),
            FrameState::Watched(matches) => Some(self.watched()? != *matches),
            FrameState::Blind => None,
        })
    }

    /// Whether the screen changes within `timeout`
    ///
    /// A blind driver cannot tell and assumes it did.
    async fn changed_since(
        &self,
        session: &mut Session,
        before: &FrameState,
        timeout: Duration,
    ) -> Result<bool> {
        if *before == FrameState::Blind {
            return Ok(true);
        }
        let outcome = self
            .poll(timeout)
            .until(|| -> Result<Option<()>> {
                session.check_alive()?;
                Ok((self.frame_differs(before)? == Some(true)).then_some(()))
            })
            .await?;
        Ok(matches!(outcome, Outcome::Ready(())))
    }

    fn baseline<T>(&self, indicators: &[(&str, T)]) -> Result<Baseline> {
        let stale = indicators
            .iter()
            .map(|(key, _)| Ok(self.locator.probe(key)?.is_some()))
            .collect::<Result<Vec<bool>>>()?;
        Ok(Baseline {
            token: self.locator.frame_token(),
            stale,
        })
    }

    /// Wait for the first of `indicators` to show up after an input
    ///
    /// An indicator already showing in `baseline` only counts once it has
    /// disappeared. With frame tokens nothing counts before the frame changed.
    async fn wait_fresh<T: Copy>(
        &self,
        session: &mut Session,
        baseline: Baseline,
        indicators: &[(&str, T)],
        timeout: Duration,
    ) -> Result<Outcome<T>> {
        let Baseline { token, mut stale } = baseline;
        let locator = &self.locator;
        self.poll(timeout)
            .until(|| -> Result<Option<T>> {
                session.check_alive()?;
                if token.is_some() && locator.frame_token() == token {
                    return Ok(None);
                }
                for ((key, value), stale) in indicators.iter().zip(stale.iter_mut()) {
                    let shown = locator.probe(key)?.is_some();
                    if *stale {
                        *stale = shown;
                    } else if shown {
                        return Ok(Some(*value));
                    }
                }
                Ok(None)
            })
            .await
    }
}
