use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QteError;

/// Physical key or button a challenge expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyCode {
    /// Printable character, always stored lowercase
    Char(char),
    Space,
    Enter,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

impl KeyCode {
    pub fn char(c: char) -> Self {
        if c == ' ' {
            return KeyCode::Space;
        }
        KeyCode::Char(c.to_lowercase().next().unwrap_or(c))
    }
}

impl FromStr for KeyCode {
    type Err = QteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyCode::char(c));
        }

        let lower = s.trim().to_lowercase();
        let code = match lower.as_str() {
            "space" => KeyCode::Space,
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            other => match other.strip_prefix('f').map(str::parse::<u8>) {
                Some(Ok(n)) if (1..=24).contains(&n) => KeyCode::F(n),
                _ => return Err(QteError::UnknownKeyCode(s.to_string())),
            },
        };
        Ok(code)
    }
}

impl TryFrom<String> for KeyCode {
    type Error = QteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for String {
    fn from(code: KeyCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Space => f.write_str("space"),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::F(n) => write!(f, "f{n}"),
        }
    }
}

/// Placement hint handed to the presentation layer untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Result of a wave attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Outcome {
    Success,
    #[default]
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

/// What a single counted press did to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressEffect {
    Partial { remaining: u32 },
    Cleared,
    AlreadyCompleted,
}

/// One required input challenge.
///
/// `presses_remaining` only moves through [`Key::press`] and [`Key::reset`],
/// so `completed` always equals `presses_remaining == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeyRecord", into = "KeyRecord")]
pub struct Key {
    pub code: KeyCode,
    pub required_presses: u32,
    pub position: Position,
    pub label: String,
    presses_remaining: u32,
}

impl Key {
    pub fn new(code: KeyCode, required_presses: u32) -> Self {
        Self {
            code,
            required_presses,
            position: Position::default(),
            label: code.to_string().to_uppercase(),
            presses_remaining: required_presses,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn presses_remaining(&self) -> u32 {
        self.presses_remaining
    }

    pub fn completed(&self) -> bool {
        self.presses_remaining == 0
    }

    pub fn reset(&mut self) {
        self.presses_remaining = self.required_presses;
    }

    pub fn press(&mut self) -> PressEffect {
        if self.completed() {
            return PressEffect::AlreadyCompleted;
        }
        self.presses_remaining -= 1;
        if self.presses_remaining == 0 {
            PressEffect::Cleared
        } else {
            PressEffect::Partial {
                remaining: self.presses_remaining,
            }
        }
    }
}

/// Serialized form of a [`Key`], without the per-attempt counter
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyRecord {
    code: KeyCode,
    #[serde(default = "default_required_presses")]
    required_presses: u32,
    #[serde(default)]
    position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

fn default_required_presses() -> u32 {
    1
}

impl From<KeyRecord> for Key {
    fn from(raw: KeyRecord) -> Self {
        let key = Key::new(raw.code, raw.required_presses).at(raw.position);
        match raw.label {
            Some(label) => key.with_label(label),
            None => key,
        }
    }
}

impl From<Key> for KeyRecord {
    fn from(key: Key) -> Self {
        Self {
            code: key.code,
            required_presses: key.required_presses,
            position: key.position,
            label: Some(key.label),
        }
    }
}

/// An ordered, fixed set of keys plus a time budget.
///
/// Key order drives layout only; every key must be cleared, in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub keys: Vec<Key>,
    pub time_limit_secs: f64,
}

impl Wave {
    pub fn new(keys: Vec<Key>, time_limit_secs: f64) -> Self {
        Self {
            keys,
            time_limit_secs,
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.keys.iter().all(Key::completed)
    }

    pub fn reset(&mut self) {
        for key in &mut self.keys {
            key.reset();
        }
    }
}
