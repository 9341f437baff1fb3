//! Synthetic input injection
//!
//! The driver never talks to a windowing system directly; it hands screen
//! coordinates and key chords to an [`InputSink`].

mod chord;
#[cfg(feature = "desktop")]
mod desktop;

pub use chord::{Chord, Key, Modifier};
#[cfg(feature = "desktop")]
pub use desktop::DesktopInput;

use thiserror::Error;

use crate::geometry::Point;

/// Mouse button for clicks and drags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    #[default]
    Left,
    Middle,
    Right,
}

/// Errors raised by input backends
#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid key chord '{0}'")]
    InvalidChord(String),

    #[error("{0}")]
    Backend(String),
}

impl From<InputError> for crate::common::Error {
    fn from(e: InputError) -> Self {
        match e {
            InputError::InvalidChord(_) => Self::Config(e.to_string()),
            InputError::Backend(msg) => Self::Input(msg),
        }
    }
}

/// Something that can inject mouse and keyboard events into the target
pub trait InputSink: Send {
    /// Click `button` at an absolute screen position
    fn click(&mut self, at: Point, button: Button) -> Result<(), InputError>;

    /// Press and release a key chord
    fn press(&mut self, chord: &Chord) -> Result<(), InputError>;

    /// Type literal text into the focused widget
    fn type_text(&mut self, text: &str) -> Result<(), InputError>;

    /// Press at `from`, move to `to`, release
    fn drag(&mut self, from: Point, to: Point, button: Button) -> Result<(), InputError>;

    /// Press a chord `times` times in a row
    fn press_repeated(&mut self, chord: &Chord, times: usize) -> Result<(), InputError> {
        for _ in 0..times {
            self.press(chord)?;
        }
        Ok(())
    }
}

impl<T: InputSink + ?Sized> InputSink for Box<T> {
    fn click(&mut self, at: Point, button: Button) -> Result<(), InputError> {
        (**self).click(at, button)
    }

    fn press(&mut self, chord: &Chord) -> Result<(), InputError> {
        (**self).press(chord)
    }

    fn type_text(&mut self, text: &str) -> Result<(), InputError> {
        (**self).type_text(text)
    }

    fn drag(&mut self, from: Point, to: Point, button: Button) -> Result<(), InputError> {
        (**self).drag(from, to, button)
    }
}
