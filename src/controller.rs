use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::QteConfig;
use crate::error::{QteError, Result};
use crate::presentation::{Presentation, WidgetHandle};
use crate::scoreboard::Scoreboard;
use crate::session::Session;
use crate::wave::{KeyCode, Outcome, PressEffect, Wave};

/// Phase of the wave state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ControllerState {
    /// Constructed, no wave armed yet
    Idle,
    /// Timer running, presses accepted
    WaveActive,
    /// Outcome decided, next wave not armed yet
    WaveResolved,
}

/// Input gathered for one tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Keys newly pressed since the previous tick (edge-triggered)
    pub pressed: HashSet<KeyCode>,
    /// Widgets the pointer is over; only read when hover gating is on
    pub hovered: HashSet<WidgetHandle>,
}

impl TickInput {
    pub fn pressed<I: IntoIterator<Item = KeyCode>>(codes: I) -> Self {
        Self {
            pressed: codes.into_iter().collect(),
            hovered: HashSet::new(),
        }
    }

    pub fn with_hovered<I: IntoIterator<Item = WidgetHandle>>(mut self, handles: I) -> Self {
        self.hovered = handles.into_iter().collect();
        self
    }
}

/// What `tick` reports back to the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub time_remaining: f64,
    pub active: bool,
    /// Set when a wave resolved during this tick
    pub resolved: Option<Outcome>,
}

/// Owns the waves, the countdown and per-key press state, and decides when a
/// wave succeeds or fails.
///
/// `tick` is the single mutating entry point once a wave is running. Every
/// resolution goes through `advance` exactly once, which flashes the outcome,
/// tears down the widgets and arms the next wave.
#[derive(Debug)]
pub struct WaveController<P: Presentation> {
    session: Session,
    state: ControllerState,
    hover_gating: bool,
    handles: Vec<WidgetHandle>,
    scoreboard: Scoreboard,
    presentation: P,
}

impl<P: Presentation> WaveController<P> {
    /// Build a controller from a validated config; refuses to start otherwise
    pub fn new(config: &QteConfig, presentation: P) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_waves_unchecked(
            config.waves.clone(),
            config.hover_gating,
            presentation,
        ))
    }

    pub fn from_waves(waves: Vec<Wave>, hover_gating: bool, presentation: P) -> Result<Self> {
        crate::config::validate_waves(&waves)?;
        Ok(Self::from_waves_unchecked(waves, hover_gating, presentation))
    }

    fn from_waves_unchecked(waves: Vec<Wave>, hover_gating: bool, presentation: P) -> Self {
        let mut controller = Self {
            session: Session::new(waves),
            state: ControllerState::Idle,
            hover_gating,
            handles: Vec::new(),
            scoreboard: Scoreboard::default(),
            presentation,
        };
        controller.reset_all_keys();
        controller
    }

    /// Arm wave `index`: reset its timer and keys and build its widgets
    pub fn start_wave(&mut self, index: usize) -> Result<()> {
        let len = self.session.waves.len();
        if index >= len {
            return Err(QteError::InvalidIndex { index, len });
        }
        // a direct start forgets the previous result; `advance` keeps it
        self.session.last_outcome = Outcome::Failure;
        self.arm(index);
        Ok(())
    }

    fn arm(&mut self, index: usize) {
        if !self.handles.is_empty() {
            let stale = std::mem::take(&mut self.handles);
            self.presentation.destroy_wave_widgets(&stale);
        }

        let wave = &mut self.session.waves[index];
        wave.reset();
        info!(
            wave = index,
            keys = wave.keys.len(),
            time_limit = wave.time_limit_secs,
            "launching wave"
        );

        self.session.current_wave_index = index;
        self.session.time_remaining = wave.time_limit_secs;
        self.presentation.on_timer_update(wave.time_limit_secs);
        self.handles = self.presentation.build_wave_widgets(index, wave);
        self.session.active = true;
        self.state = ControllerState::WaveActive;
    }

    /// Advance the countdown and apply this tick's presses.
    ///
    /// The timeout check runs before presses are applied, so a press landing
    /// on the tick the timer runs out does not save the wave.
    pub fn tick(&mut self, delta_secs: f64, input: &TickInput) -> TickReport {
        if !self.session.active {
            return self.report(None);
        }

        let delta = if delta_secs.is_finite() && delta_secs > 0.0 {
            delta_secs
        } else {
            0.0
        };
        self.session.time_remaining -= delta;
        self.presentation
            .on_timer_update(self.session.time_remaining.max(0.0));

        if self.session.time_remaining <= 0.0 {
            self.resolve(Outcome::Failure);
            return self.report(Some(Outcome::Failure));
        }

        self.apply_presses(input);

        if self.session.current_wave().is_cleared() {
            self.resolve(Outcome::Success);
            return self.report(Some(Outcome::Success));
        }

        self.report(None)
    }

    fn apply_presses(&mut self, input: &TickInput) {
        if input.pressed.is_empty() {
            return;
        }

        let index = self.session.current_wave_index;
        let wave = &mut self.session.waves[index];
        for (slot, key) in wave.keys.iter_mut().enumerate() {
            if !input.pressed.contains(&key.code) || key.completed() {
                continue;
            }
            let Some(&handle) = self.handles.get(slot) else {
                continue;
            };
            // each press is gated on its own tick's hover state
            if self.hover_gating && !input.hovered.contains(&handle) {
                debug!(wave = index, slot, code = %key.code, "press ignored, not hovered");
                continue;
            }

            match key.press() {
                PressEffect::Partial { remaining } => {
                    debug!(wave = index, slot, code = %key.code, remaining, "key pressed");
                    self.presentation.on_key_partial_press(handle, remaining);
                }
                PressEffect::Cleared => {
                    debug!(wave = index, slot, code = %key.code, "key cleared");
                    self.presentation.on_key_cleared(handle);
                }
                PressEffect::AlreadyCompleted => {}
            }
        }
    }

    fn resolve(&mut self, outcome: Outcome) {
        self.session.active = false;
        self.session.last_outcome = outcome;
        self.state = ControllerState::WaveResolved;
        self.advance();
    }

    /// The only place wave transitions happen
    fn advance(&mut self) {
        let outcome = self.session.last_outcome;
        info!(wave = self.session.current_wave_index, %outcome, "wave resolved");

        self.presentation.on_wave_resolved(outcome);
        self.scoreboard.record(outcome);

        let finished = std::mem::take(&mut self.handles);
        self.presentation.destroy_wave_widgets(&finished);

        let mut next = self.session.current_wave_index + 1;
        if next >= self.session.waves.len() {
            next = 0;
            self.reset_all_keys();
            self.scoreboard.cycle_completed();
            info!(
                cycles = self.scoreboard.cycles_completed,
                "all waves played, restarting"
            );
        }

        self.arm(next);
    }

    /// Restore every key of every wave to its full press count
    pub fn reset_all_keys(&mut self) {
        for wave in &mut self.session.waves {
            wave.reset();
        }
    }

    fn report(&self, resolved: Option<Outcome>) -> TickReport {
        TickReport {
            time_remaining: self.session.time_remaining,
            active: self.session.active,
            resolved,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_wave(&self) -> &Wave {
        self.session.current_wave()
    }

    pub fn current_wave_index(&self) -> usize {
        self.session.current_wave_index
    }

    pub fn time_remaining(&self) -> f64 {
        self.session.time_remaining
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }

    pub fn last_outcome(&self) -> Outcome {
        self.session.last_outcome
    }

    pub fn hover_gating(&self) -> bool {
        self.hover_gating
    }

    pub fn set_hover_gating(&mut self, enabled: bool) {
        self.hover_gating = enabled;
    }

    /// Widget handles of the active wave, in key order
    pub fn handles(&self) -> &[WidgetHandle] {
        &self.handles
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{PresentationEvent, RecordingPresentation};
    use crate::wave::Key;
    use assert_matches::assert_matches;

    const A: KeyCode = KeyCode::Char('a');
    const B: KeyCode = KeyCode::Char('b');
    const C: KeyCode = KeyCode::Char('c');

    fn controller(waves: Vec<Wave>) -> WaveController<RecordingPresentation> {
        let mut c = WaveController::from_waves(waves, false, RecordingPresentation::new()).unwrap();
        c.start_wave(0).unwrap();
        c.presentation_mut().clear();
        c
    }

    fn wave(keys: &[(KeyCode, u32)], time_limit: f64) -> Wave {
        Wave::new(
            keys.iter().map(|&(code, n)| Key::new(code, n)).collect(),
            time_limit,
        )
    }

    fn none() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn starts_idle_and_ticks_are_noops() {
        let mut c =
            WaveController::from_waves(vec![wave(&[(A, 1)], 1.0)], false, RecordingPresentation::new())
                .unwrap();
        assert_eq!(c.state(), ControllerState::Idle);
        let report = c.tick(5.0, &TickInput::pressed([A]));
        assert!(!report.active);
        assert_eq!(report.resolved, None);
        assert!(c.presentation().events.is_empty());
    }

    #[test]
    fn start_wave_arms_timer_and_builds_widgets() {
        let mut c = WaveController::from_waves(
            vec![wave(&[(A, 1), (B, 2)], 3.5)],
            false,
            RecordingPresentation::new(),
        )
        .unwrap();
        c.start_wave(0).unwrap();

        assert_eq!(c.state(), ControllerState::WaveActive);
        assert!(c.is_active());
        assert_eq!(c.time_remaining(), 3.5);
        assert_eq!(c.last_outcome(), Outcome::Failure);
        assert_eq!(c.handles().len(), 2);
        assert_matches!(
            &c.presentation().events[..],
            [PresentationEvent::Timer(t), PresentationEvent::Built { wave_index: 0, handles }]
                if *t == 3.5 && handles.len() == 2
        );
    }

    #[test]
    fn success_survives_arming_the_next_wave() {
        let mut c = controller(vec![wave(&[(A, 1)], 5.0), wave(&[(B, 1)], 5.0)]);
        c.tick(0.1, &TickInput::pressed([A]));

        assert_eq!(c.current_wave_index(), 1);
        assert!(c.is_active());
        assert_eq!(c.last_outcome(), Outcome::Success);
        assert_eq!(c.session().last_outcome(), Outcome::Success);

        c.start_wave(0).unwrap();
        assert_eq!(c.last_outcome(), Outcome::Failure);
    }

    #[test]
    fn arming_a_wave_shows_its_full_time() {
        let mut c = controller(vec![wave(&[(A, 1)], 1.0), wave(&[(B, 1)], 4.0)]);
        c.tick(1.5, &none());

        let events = &c.presentation().events;
        assert_eq!(events[0], PresentationEvent::Timer(0.0));
        assert_eq!(
            events.last(),
            Some(&PresentationEvent::Built {
                wave_index: 1,
                handles: c.handles().to_vec(),
            })
        );
        assert!(events.contains(&PresentationEvent::Timer(4.0)));
    }

    #[test]
    fn start_wave_rejects_out_of_range_index() {
        let mut c = controller(vec![wave(&[(A, 1)], 1.0)]);
        assert_matches!(
            c.start_wave(1),
            Err(QteError::InvalidIndex { index: 1, len: 1 })
        );
        assert_eq!(c.current_wave_index(), 0);
    }

    #[test]
    fn two_press_scenario_succeeds() {
        let mut c = controller(vec![wave(&[(A, 2)], 5.0)]);
        let handle = c.handles()[0];

        let report = c.tick(1.0, &none());
        assert_eq!(report.time_remaining, 4.0);
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 2);

        c.tick(1.0, &TickInput::pressed([A]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 1);
        assert_eq!(c.presentation().partial_presses(), vec![(handle, 1)]);

        let report = c.tick(1.0, &TickInput::pressed([A]));
        assert_eq!(report.resolved, Some(Outcome::Success));
        assert_eq!(c.last_outcome(), Outcome::Success);
        assert_eq!(c.presentation().cleared(), vec![handle]);
        assert_eq!(c.presentation().resolutions(), vec![Outcome::Success]);
        assert_eq!(c.scoreboard().successes, 1);
    }

    #[test]
    fn timeout_scenario_fails_without_touching_keys() {
        let mut c = controller(vec![wave(&[(B, 1)], 2.0)]);
        let report = c.tick(2.1, &none());

        assert_eq!(report.resolved, Some(Outcome::Failure));
        assert_eq!(c.last_outcome(), Outcome::Failure);
        assert_eq!(c.presentation().resolutions(), vec![Outcome::Failure]);
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 1);
    }

    #[test]
    fn press_on_expiry_tick_does_not_save_wave() {
        let mut c = controller(vec![wave(&[(A, 1)], 1.0)]);
        let report = c.tick(1.0, &TickInput::pressed([A]));
        assert_eq!(report.resolved, Some(Outcome::Failure));
        assert!(c.presentation().cleared().is_empty());
    }

    #[test]
    fn zero_time_limit_fails_on_first_tick() {
        let mut c = controller(vec![wave(&[(A, 1)], 0.0)]);
        let report = c.tick(0.0, &none());
        assert_eq!(report.resolved, Some(Outcome::Failure));
    }

    #[test]
    fn all_zero_press_wave_clears_on_first_tick() {
        let mut c = controller(vec![wave(&[(A, 0), (B, 0)], 2.0)]);
        let report = c.tick(0.1, &none());
        assert_eq!(report.resolved, Some(Outcome::Success));
    }

    #[test]
    fn completed_key_ignores_extra_presses() {
        let mut c = controller(vec![wave(&[(A, 1), (B, 1)], 5.0)]);
        c.tick(0.1, &TickInput::pressed([A]));
        c.tick(0.1, &TickInput::pressed([A]));
        c.tick(0.1, &TickInput::pressed([A]));

        assert_eq!(c.current_wave().keys[0].presses_remaining(), 0);
        assert_eq!(c.presentation().cleared().len(), 1);
        assert!(c.is_active());
    }

    #[test]
    fn keys_clear_in_any_order() {
        let mut c = controller(vec![wave(&[(A, 1), (B, 1), (C, 1)], 5.0)]);
        c.tick(0.1, &TickInput::pressed([C]));
        c.tick(0.1, &TickInput::pressed([A]));
        let report = c.tick(0.1, &TickInput::pressed([B]));
        assert_eq!(report.resolved, Some(Outcome::Success));
    }

    #[test]
    fn simultaneous_presses_count_once_each() {
        let mut c = controller(vec![wave(&[(A, 2), (B, 1)], 5.0)]);
        c.tick(0.1, &TickInput::pressed([A, B]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 1);
        assert!(c.current_wave().keys[1].completed());
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        let mut c = controller(vec![wave(&[(A, 1)], 5.0)]);
        c.tick(0.1, &TickInput::pressed([B, C]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 1);
        assert!(c.presentation().partial_presses().is_empty());
    }

    #[test]
    fn duplicate_codes_share_a_press() {
        let mut c = controller(vec![wave(&[(A, 1), (A, 2)], 5.0)]);
        c.tick(0.1, &TickInput::pressed([A]));
        assert!(c.current_wave().keys[0].completed());
        assert_eq!(c.current_wave().keys[1].presses_remaining(), 1);
    }

    #[test]
    fn negative_delta_is_treated_as_zero() {
        let mut c = controller(vec![wave(&[(A, 1)], 2.0)]);
        let report = c.tick(-5.0, &none());
        assert_eq!(report.time_remaining, 2.0);
        let report = c.tick(f64::NAN, &none());
        assert_eq!(report.time_remaining, 2.0);
    }

    #[test]
    fn timer_updates_are_reported() {
        let mut c = controller(vec![wave(&[(A, 1)], 2.0)]);
        c.tick(0.5, &none());
        assert_eq!(c.presentation().events, vec![PresentationEvent::Timer(1.5)]);
    }

    #[test]
    fn advance_destroys_widgets_then_builds_next_wave() {
        let mut c = controller(vec![wave(&[(A, 1)], 5.0), wave(&[(B, 1), (C, 1)], 4.0)]);
        let first = c.handles().to_vec();
        c.tick(0.1, &TickInput::pressed([A]));

        let events = &c.presentation().events;
        let destroyed = events
            .iter()
            .position(|e| *e == PresentationEvent::Destroyed(first.clone()))
            .expect("old widgets destroyed");
        let built = events
            .iter()
            .position(|e| matches!(e, PresentationEvent::Built { wave_index: 1, .. }))
            .expect("next wave built");
        assert!(destroyed < built);

        assert_eq!(c.current_wave_index(), 1);
        assert_eq!(c.time_remaining(), 4.0);
        assert_eq!(c.handles().len(), 2);
        assert!(c.is_active());
        assert_eq!(c.state(), ControllerState::WaveActive);
    }

    #[test]
    fn wrap_resets_every_wave() {
        let mut c = controller(vec![wave(&[(A, 2)], 5.0), wave(&[(B, 1), (C, 3)], 5.0)]);

        c.tick(0.1, &TickInput::pressed([A]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 1);
        c.tick(10.0, &none());
        assert_eq!(c.current_wave_index(), 1);
        // the failed wave keeps its state until the cycle wraps
        assert_eq!(c.session().waves()[0].keys[0].presses_remaining(), 1);

        c.tick(0.1, &TickInput::pressed([B, C]));
        assert!(c.session().waves()[1].keys[0].completed());
        c.tick(10.0, &none());

        assert_eq!(c.current_wave_index(), 0);
        assert_eq!(c.scoreboard().cycles_completed, 1);
        for wave in c.session().waves() {
            for key in &wave.keys {
                assert_eq!(key.presses_remaining(), key.required_presses);
            }
        }
    }

    #[test]
    fn hover_gating_requires_hover_on_each_press() {
        let mut c = controller(vec![wave(&[(A, 3)], 5.0)]);
        c.set_hover_gating(true);
        let handle = c.handles()[0];

        c.tick(0.1, &TickInput::pressed([A]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 3);

        c.tick(0.1, &TickInput::pressed([A]).with_hovered([handle]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 2);

        // hover lost again: press silently dropped, not buffered
        c.tick(0.1, &TickInput::pressed([A]));
        c.tick(0.1, &TickInput::default().with_hovered([handle]));
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 2);
    }

    #[test]
    fn hover_is_ignored_without_gating() {
        let mut c = controller(vec![wave(&[(A, 1)], 5.0)]);
        let report = c.tick(0.1, &TickInput::pressed([A]));
        assert_eq!(report.resolved, Some(Outcome::Success));
    }

    #[test]
    fn single_wave_restarts_after_failure() {
        let mut c = controller(vec![wave(&[(A, 2)], 1.0)]);
        c.tick(0.1, &TickInput::pressed([A]));
        c.tick(1.0, &none());

        assert_eq!(c.current_wave_index(), 0);
        assert_eq!(c.current_wave().keys[0].presses_remaining(), 2);
        assert_eq!(c.time_remaining(), 1.0);
        assert_eq!(c.scoreboard().failures, 1);
    }

    #[test]
    fn restarting_a_running_wave_drops_its_widgets() {
        let mut c = controller(vec![wave(&[(A, 1)], 1.0), wave(&[(B, 1)], 1.0)]);
        let old = c.handles().to_vec();
        c.start_wave(1).unwrap();
        assert_eq!(c.presentation().events[0], PresentationEvent::Destroyed(old));
        assert_eq!(c.current_wave_index(), 1);
    }
}
