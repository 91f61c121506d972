use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::presentation::WidgetHandle;
use crate::wave::Outcome;

/// How long the timer background flashes after a wave resolves
pub const FLASH_DURATION: Duration = Duration::from_millis(200);
/// How long a pressed key stays enlarged
pub const PULSE_DURATION: Duration = Duration::from_millis(200);
pub const PULSE_SCALE: f32 = 1.1;

/// A fire-and-forget effect that expires on its own
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEffect<T> {
    pub value: T,
    expires_at: Instant,
}

impl<T: Copy> TimedEffect<T> {
    pub fn new(value: T, now: Instant, duration: Duration) -> Self {
        Self {
            value,
            expires_at: now + duration,
        }
    }

    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Presentation-side effect timers, independent of the controller tick
#[derive(Debug, Default)]
pub struct Effects {
    flash: Option<TimedEffect<Outcome>>,
    pulses: HashMap<WidgetHandle, TimedEffect<f32>>,
}

impl Effects {
    /// Starting a new flash replaces one still running
    pub fn flash(&mut self, outcome: Outcome, now: Instant) {
        self.flash = Some(TimedEffect::new(outcome, now, FLASH_DURATION));
    }

    pub fn pulse(&mut self, handle: WidgetHandle, now: Instant) {
        self.pulses
            .insert(handle, TimedEffect::new(PULSE_SCALE, now, PULSE_DURATION));
    }

    /// Outcome color to show on the timer, if a flash is running
    pub fn active_flash(&self, now: Instant) -> Option<Outcome> {
        self.flash.filter(|f| f.is_live(now)).map(|f| f.value)
    }

    /// Current scale for a widget; 1.0 once its pulse has expired
    pub fn scale(&self, handle: WidgetHandle, now: Instant) -> f32 {
        self.pulses
            .get(&handle)
            .filter(|p| p.is_live(now))
            .map_or(1.0, |p| p.value)
    }

    /// Widget pulses for destroyed widgets are dropped; a running flash is not
    pub fn forget(&mut self, handle: WidgetHandle) {
        self.pulses.remove(&handle);
    }

    /// Drop expired effects
    pub fn prune(&mut self, now: Instant) {
        if self.flash.is_some_and(|f| !f.is_live(now)) {
            self.flash = None;
        }
        self.pulses.retain(|_, p| p.is_live(now));
    }
}
