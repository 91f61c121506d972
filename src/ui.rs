pub mod layout;
pub mod motion;

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::{
    controller::WaveController,
    effects::Effects,
    presentation::{Presentation, WidgetHandle},
    scoreboard::Scoreboard,
    wave::{Outcome, Wave},
};

use self::motion::Drift;

const TIMER_BACKGROUND: Color = Color::DarkGray;
const CHECK_MARK: &str = "✓";

/// Presentation-side record for one key box
#[derive(Debug, Clone)]
pub struct KeyWidget {
    pub label: String,
    pub remaining: u32,
    pub cleared: bool,
    pub drift: Drift,
}

impl KeyWidget {
    pub fn counter_text(&self) -> String {
        if self.cleared {
            CHECK_MARK.to_string()
        } else {
            self.remaining.to_string()
        }
    }
}

/// Terminal presentation: key boxes, countdown and effects
#[derive(Debug)]
pub struct TuiPresentation {
    widgets: BTreeMap<WidgetHandle, KeyWidget>,
    effects: Effects,
    next_handle: u64,
    seconds_remaining: f64,
    keys_move_randomly: bool,
    keys_speed: f32,
    play_area: Rect,
    pointer: Option<(u16, u16)>,
}

impl TuiPresentation {
    pub fn new(keys_move_randomly: bool, keys_speed: f32) -> Self {
        Self {
            widgets: BTreeMap::new(),
            effects: Effects::default(),
            next_handle: 0,
            seconds_remaining: 0.0,
            keys_move_randomly,
            keys_speed,
            play_area: Rect::default(),
            pointer: None,
        }
    }

    /// Recompute the play area for the current terminal size
    pub fn resize(&mut self, area: Rect) {
        self.play_area = layout::split(area).play;
    }

    pub fn set_pointer(&mut self, column: u16, row: u16) {
        self.pointer = Some((column, row));
    }

    /// Advance key drift and drop expired effects
    pub fn update(&mut self, dt: f32, now: Instant) {
        if self.keys_move_randomly {
            for widget in self.widgets.values_mut() {
                widget.drift.step(dt, self.keys_speed);
            }
        }
        self.effects.prune(now);
    }

    pub fn widget(&self, handle: WidgetHandle) -> Option<&KeyWidget> {
        self.widgets.get(&handle)
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Screen rect of a key box at rest size
    pub fn widget_rect(&self, handle: WidgetHandle) -> Option<Rect> {
        let widget = self.widgets.get(&handle)?;
        let (w, h) = layout::box_size(&widget.label, &widget.counter_text());
        Some(layout::place(self.play_area, widget.drift.pos, w, h))
    }

    /// Widgets currently under the pointer
    pub fn hovered(&self) -> HashSet<WidgetHandle> {
        let Some((column, row)) = self.pointer else {
            return HashSet::new();
        };
        self.widgets
            .keys()
            .copied()
            .filter(|&h| {
                self.widget_rect(h)
                    .is_some_and(|r| layout::contains(r, column, row))
            })
            .collect()
    }
}

impl Presentation for TuiPresentation {
    fn build_wave_widgets(&mut self, _wave_index: usize, wave: &Wave) -> Vec<WidgetHandle> {
        wave.keys
            .iter()
            .map(|key| {
                self.next_handle += 1;
                let handle = WidgetHandle(self.next_handle);
                self.widgets.insert(
                    handle,
                    KeyWidget {
                        label: key.label.clone(),
                        remaining: key.presses_remaining(),
                        cleared: key.completed(),
                        drift: Drift::new(key.position),
                    },
                );
                handle
            })
            .collect()
    }

    fn destroy_wave_widgets(&mut self, handles: &[WidgetHandle]) {
        for handle in handles {
            self.widgets.remove(handle);
            self.effects.forget(*handle);
        }
    }

    fn on_key_partial_press(&mut self, handle: WidgetHandle, remaining: u32) {
        if let Some(widget) = self.widgets.get_mut(&handle) {
            widget.remaining = remaining;
        }
        self.effects.pulse(handle, Instant::now());
    }

    fn on_key_cleared(&mut self, handle: WidgetHandle) {
        if let Some(widget) = self.widgets.get_mut(&handle) {
            widget.remaining = 0;
            widget.cleared = true;
        }
        self.effects.pulse(handle, Instant::now());
    }

    fn on_wave_resolved(&mut self, outcome: Outcome) {
        self.effects.flash(outcome, Instant::now());
    }

    fn on_timer_update(&mut self, seconds_remaining: f64) {
        self.seconds_remaining = seconds_remaining;
    }
}

/// Everything one frame needs, borrowed from the controller
pub struct GameView<'a> {
    pub presentation: &'a TuiPresentation,
    pub wave_index: usize,
    pub wave_count: usize,
    pub scoreboard: &'a Scoreboard,
    pub hover_gating: bool,
    pub now: Instant,
}

impl<'a> GameView<'a> {
    pub fn new(controller: &'a WaveController<TuiPresentation>, now: Instant) -> Self {
        Self {
            presentation: controller.presentation(),
            wave_index: controller.current_wave_index(),
            wave_count: controller.session().waves().len(),
            scoreboard: controller.scoreboard(),
            hover_gating: controller.hover_gating(),
            now,
        }
    }
}

impl Widget for &GameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let regions = layout::split(area);
        let p = self.presentation;

        let mut header = vec![Span::styled(
            format!("Wave {}/{}", self.wave_index + 1, self.wave_count),
            bold_style,
        )];
        if self.hover_gating {
            header.push(Span::styled("   hover to arm keys", dim_style));
        }
        Paragraph::new(Line::from(header))
            .alignment(Alignment::Center)
            .render(regions.header, buf);

        let timer_bg = match p.effects.active_flash(self.now) {
            Some(Outcome::Success) => Color::Green,
            Some(Outcome::Failure) => Color::Red,
            None => TIMER_BACKGROUND,
        };
        Paragraph::new(Span::styled(
            format!("{:.2}", p.seconds_remaining),
            bold_style.fg(Color::White),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().bg(timer_bg))
        .render(regions.timer, buf);

        let hovered = if self.hover_gating {
            p.hovered()
        } else {
            HashSet::new()
        };

        for (&handle, widget) in &p.widgets {
            let Some(rest) = p.widget_rect(handle) else {
                continue;
            };
            let scale = p.effects.scale(handle, self.now);
            let rect = layout::scaled(rest, scale, regions.play);

            let border_style = if widget.cleared {
                Style::default().fg(Color::Green)
            } else if hovered.contains(&handle) {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let border_style = if scale > 1.0 {
                border_style.add_modifier(Modifier::BOLD)
            } else {
                border_style
            };
            let counter_style = if widget.cleared {
                bold_style.fg(Color::Green)
            } else {
                Style::default().fg(Color::Cyan)
            };

            Clear.render(rect, buf);
            Paragraph::new(vec![
                Line::from(Span::styled(widget.label.clone(), bold_style)),
                Line::from(Span::styled(widget.counter_text(), counter_style)),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .render(rect, buf);
        }

        Paragraph::new(vec![
            Line::from(Span::styled(self.scoreboard.summary(), dim_style)),
            Line::from(Span::styled("(esc) quit", italic_style)),
        ])
        .alignment(Alignment::Center)
        .render(regions.footer, buf);
    }
}
