//! Input injection on the local desktop via enigo

use enigo::{Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

use super::{Button, Chord, InputError, InputSink, Key, Modifier};
use crate::geometry::Point;

/// Injects real mouse and keyboard events
pub struct DesktopInput {
    enigo: Enigo,
}

impl DesktopInput {
    /// Connect to the desktop input system
    pub fn new() -> Result<Self, InputError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InputError::Backend(format!("failed to connect input backend: {}", e)))?;
        Ok(Self { enigo })
    }
}

fn backend<E: std::fmt::Display>(e: E) -> InputError {
    InputError::Backend(e.to_string())
}

fn map_button(button: Button) -> enigo::Button {
    match button {
        Button::Left => enigo::Button::Left,
        Button::Middle => enigo::Button::Middle,
        Button::Right => enigo::Button::Right,
    }
}

fn map_modifier(modifier: Modifier) -> enigo::Key {
    match modifier {
        Modifier::Ctrl => enigo::Key::Control,
        Modifier::Shift => enigo::Key::Shift,
        Modifier::Alt => enigo::Key::Alt,
        Modifier::Meta => enigo::Key::Meta,
    }
}

fn map_key(key: Key) -> Result<enigo::Key, InputError> {
    let mapped = match key {
        Key::Char(c) => enigo::Key::Unicode(c),
        Key::Enter => enigo::Key::Return,
        Key::Tab => enigo::Key::Tab,
        Key::Space => enigo::Key::Space,
        Key::Escape => enigo::Key::Escape,
        Key::Backspace => enigo::Key::Backspace,
        Key::Delete => enigo::Key::Delete,
        Key::F(n) => match n {
            1 => enigo::Key::F1,
            2 => enigo::Key::F2,
            3 => enigo::Key::F3,
            4 => enigo::Key::F4,
            5 => enigo::Key::F5,
            6 => enigo::Key::F6,
            7 => enigo::Key::F7,
            8 => enigo::Key::F8,
            9 => enigo::Key::F9,
            10 => enigo::Key::F10,
            11 => enigo::Key::F11,
            12 => enigo::Key::F12,
            _ => return Err(InputError::Backend(format!("F{} is not supported", n))),
        },
    };
    Ok(mapped)
}

impl InputSink for DesktopInput {
    fn click(&mut self, at: Point, button: Button) -> Result<(), InputError> {
        self.enigo
            .move_mouse(at.x, at.y, Coordinate::Abs)
            .map_err(backend)?;
        self.enigo
            .button(map_button(button), Direction::Click)
            .map_err(backend)
    }

    fn press(&mut self, chord: &Chord) -> Result<(), InputError> {
        let key = map_key(chord.key)?;
        for m in &chord.modifiers {
            self.enigo
                .key(map_modifier(*m), Direction::Press)
                .map_err(backend)?;
        }
        let result = self.enigo.key(key, Direction::Click).map_err(backend);
        // Modifiers are released even if the key itself failed
        for m in chord.modifiers.iter().rev() {
            let _ = self.enigo.key(map_modifier(*m), Direction::Release);
        }
        result
    }

    fn type_text(&mut self, text: &str) -> Result<(), InputError> {
        self.enigo.text(text).map_err(backend)
    }

    fn drag(&mut self, from: Point, to: Point, button: Button) -> Result<(), InputError> {
        let button = map_button(button);
        self.enigo
            .move_mouse(from.x, from.y, Coordinate::Abs)
            .map_err(backend)?;
        self.enigo.button(button, Direction::Press).map_err(backend)?;
        let moved = self
            .enigo
            .move_mouse(to.x, to.y, Coordinate::Abs)
            .map_err(backend);
        let released = self.enigo.button(button, Direction::Release).map_err(backend);
        moved.and(released)
    }
}
