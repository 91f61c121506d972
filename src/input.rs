use std::collections::HashSet;

use crossterm::event::{KeyCode as CtKeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::wave::KeyCode;

/// Map a terminal key to a challenge key code, if it can be one
pub fn key_code(code: CtKeyCode) -> Option<KeyCode> {
    let mapped = match code {
        CtKeyCode::Char(c) => KeyCode::char(c),
        CtKeyCode::Enter => KeyCode::Enter,
        CtKeyCode::Tab => KeyCode::Tab,
        CtKeyCode::Backspace => KeyCode::Backspace,
        CtKeyCode::Up => KeyCode::Up,
        CtKeyCode::Down => KeyCode::Down,
        CtKeyCode::Left => KeyCode::Left,
        CtKeyCode::Right => KeyCode::Right,
        CtKeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    Some(mapped)
}

/// Esc or ctrl+c
pub fn is_quit(key: &KeyEvent) -> bool {
    key.code == CtKeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == CtKeyCode::Char('c'))
}

/// Collects edge-triggered presses between two ticks.
///
/// Auto-repeat events never count. Once the terminal has shown it reports
/// releases, a press of a key that is still held is ignored too; before that
/// every press event counts, at most once per tick.
#[derive(Debug, Default)]
pub struct PressTracker {
    pending: HashSet<KeyCode>,
    held: HashSet<KeyCode>,
    reports_releases: bool,
}

impl PressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key event; returns the code if it registered as a new press
    pub fn on_key(&mut self, event: &KeyEvent) -> Option<KeyCode> {
        let code = key_code(event.code)?;
        match event.kind {
            KeyEventKind::Press => {
                if self.reports_releases && !self.held.insert(code) {
                    return None;
                }
                self.pending.insert(code);
                Some(code)
            }
            KeyEventKind::Repeat => None,
            KeyEventKind::Release => {
                self.reports_releases = true;
                self.held.remove(&code);
                None
            }
        }
    }

    /// Presses gathered since the previous drain
    pub fn drain(&mut self) -> HashSet<KeyCode> {
        std::mem::take(&mut self.pending)
    }
}
