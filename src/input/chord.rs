//! Key chords such as `ctrl+shift+p`
//!
//! Chords are written as strings in the config file and parsed once when the
//! driver is built.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::InputError;

/// Modifier held while the chord's key is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl Modifier {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ctrl" | "control" => Some(Self::Ctrl),
            "shift" => Some(Self::Shift),
            "alt" | "option" => Some(Self::Alt),
            "meta" | "super" | "cmd" | "win" => Some(Self::Meta),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Ctrl => "ctrl",
            Self::Shift => "shift",
            Self::Alt => "alt",
            Self::Meta => "meta",
        }
    }
}

/// Non-modifier key of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Space,
    Escape,
    Backspace,
    Delete,
    /// Function key F1..F24
    F(u8),
}

impl Key {
    fn parse(s: &str) -> Option<Self> {
        let key = match s {
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "space" => Self::Space,
            "esc" | "escape" => Self::Escape,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "plus" => Self::Char('+'),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    (Some('f'), Some(_)) => {
                        let n: u8 = s[1..].parse().ok()?;
                        if !(1..=24).contains(&n) {
                            return None;
                        }
                        Self::F(n)
                    }
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char('+') => write!(f, "plus"),
            Self::Char(c) => write!(f, "{}", c),
            Self::Enter => write!(f, "enter"),
            Self::Tab => write!(f, "tab"),
            Self::Space => write!(f, "space"),
            Self::Escape => write!(f, "esc"),
            Self::Backspace => write!(f, "backspace"),
            Self::Delete => write!(f, "delete"),
            Self::F(n) => write!(f, "f{}", n),
        }
    }
}

/// A key pressed while zero or more modifiers are held
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Chord {
    pub modifiers: Vec<Modifier>,
    pub key: Key,
}

impl Chord {
    /// A bare key with no modifiers
    pub fn key(key: Key) -> Self {
        Self {
            modifiers: Vec::new(),
            key,
        }
    }

    /// A key pressed while `modifiers` are held
    pub fn with(modifiers: &[Modifier], key: Key) -> Self {
        Self {
            modifiers: modifiers.to_vec(),
            key,
        }
    }

    /// Parse a chord string like "ctrl+z", "F12" or "ctrl+shift+p"
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Err(InputError::InvalidChord(s.to_string()));
        }

        let parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let (key_part, modifier_parts) = parts
            .split_last()
            .ok_or_else(|| InputError::InvalidChord(s.to_string()))?;

        let mut modifiers = Vec::new();
        for part in modifier_parts {
            let modifier =
                Modifier::parse(part).ok_or_else(|| InputError::InvalidChord(s.to_string()))?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }

        let key = Key::parse(key_part).ok_or_else(|| InputError::InvalidChord(s.to_string()))?;
        Ok(Self { modifiers, key })
    }
}

impl FromStr for Chord {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Chord {
    type Error = InputError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}+", m.name())?;
        }
        write!(f, "{}", self.key)
    }
}
