use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::UnicodeWidthStr;

use crate::wave::Position;

pub const HORIZONTAL_MARGIN: u16 = 2;

/// Screen regions, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub header: Rect,
    pub timer: Rect,
    pub play: Rect,
    pub footer: Rect,
}

pub fn split(area: Rect) -> Regions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // wave header
            Constraint::Length(3), // countdown
            Constraint::Min(3),    // key boxes
            Constraint::Length(2), // scoreboard + legend
        ])
        .split(area);

    Regions {
        header: chunks[0],
        timer: chunks[1],
        play: chunks[2],
        footer: chunks[3],
    }
}

/// Width and height of a key box holding `label` over `counter`, borders included
pub fn box_size(label: &str, counter: &str) -> (u16, u16) {
    let inner = label.width().max(counter.width()).max(1) as u16;
    (inner + 4, 4)
}

/// Place a `w` x `h` box centered on `pos`, where (-1, -1) is the top left
/// of `play` and (1, 1) the bottom right. The box is kept inside `play`.
pub fn place(play: Rect, pos: Position, w: u16, h: u16) -> Rect {
    let w = w.min(play.width);
    let h = h.min(play.height);

    let cx = play.x as f32 + (pos.x.clamp(-1.0, 1.0) + 1.0) / 2.0 * play.width as f32;
    let cy = play.y as f32 + (pos.y.clamp(-1.0, 1.0) + 1.0) / 2.0 * play.height as f32;

    let max_x = play.x + play.width - w;
    let max_y = play.y + play.height - h;
    let x = ((cx - w as f32 / 2.0).round().max(play.x as f32) as u16).min(max_x);
    let y = ((cy - h as f32 / 2.0).round().max(play.y as f32) as u16).min(max_y);

    Rect::new(x, y, w, h)
}

/// Grow `rect` by one cell on each side when `scale` is above 1, staying in `bounds`
pub fn scaled(rect: Rect, scale: f32, bounds: Rect) -> Rect {
    if scale <= 1.0 {
        return rect;
    }
    let grown = Rect::new(
        rect.x.saturating_sub(1),
        rect.y.saturating_sub(1),
        rect.width + 2,
        rect.height + 2,
    );
    grown.intersection(bounds)
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}
