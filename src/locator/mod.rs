//! Locating UI elements on screen
//!
//! The driver only knows elements by logical reference key (`"ready"`,
//! `"mode.shape"`, ...). How a key becomes a screen rectangle is up to the
//! [`Locator`] implementation.

pub mod keys;
mod poll;
mod references;

pub use poll::{Outcome, Poll};
pub use references::ReferenceStore;

use std::sync::Arc;

use thiserror::Error;

use crate::geometry::Region;

/// A successful match of a reference on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub region: Region,
    /// Similarity in `0.0..=1.0`
    pub score: f32,
}

impl Match {
    pub fn new(region: Region, score: f32) -> Self {
        Self { region, score }
    }
}

/// Errors raised by a locator
#[derive(Error, Debug)]
pub enum LocateError {
    /// The reference is not visible right now; callers poll again
    #[error("'{0}' not found")]
    NotFound(String),

    /// The backend itself failed (screen capture, missing reference image)
    #[error("{0}")]
    Backend(String),
}

impl From<LocateError> for crate::common::Error {
    fn from(e: LocateError) -> Self {
        Self::Locator(e.to_string())
    }
}

/// Finds UI elements on the live screen by reference key
pub trait Locator: Send + Sync {
    /// Resolve a reference key to its current on-screen region
    fn resolve(&self, key: &str) -> Result<Match, LocateError>;

    /// Opaque token that changes whenever the observed screen changes
    ///
    /// Backends that cannot tell return `None`; the driver then compares
    /// the matches of its configured watch references instead.
    fn frame_token(&self) -> Option<u64> {
        None
    }

    /// Non-blocking probe: `Ok(None)` when the reference is not visible
    fn probe(&self, key: &str) -> Result<Option<Match>, LocateError> {
        match self.resolve(key) {
            Ok(m) => Ok(Some(m)),
            Err(LocateError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: Locator + ?Sized> Locator for Arc<T> {
    fn resolve(&self, key: &str) -> Result<Match, LocateError> {
        (**self).resolve(key)
    }

    fn frame_token(&self) -> Option<u64> {
        (**self).frame_token()
    }
}

impl<T: Locator + ?Sized> Locator for Box<T> {
    fn resolve(&self, key: &str) -> Result<Match, LocateError> {
        (**self).resolve(key)
    }

    fn frame_token(&self) -> Option<u64> {
        (**self).frame_token()
    }
}
