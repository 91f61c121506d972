use crate::wave::{Outcome, Wave};

/// Process-wide game state owned by the wave controller.
///
/// Waves are fixed at construction and cycle: after the last one the index
/// wraps back to 0. Nothing here outlives the process.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) waves: Vec<Wave>,
    pub(crate) current_wave_index: usize,
    pub(crate) time_remaining: f64,
    pub(crate) active: bool,
    pub(crate) last_outcome: Outcome,
}

impl Session {
    pub fn new(waves: Vec<Wave>) -> Self {
        Self {
            waves,
            current_wave_index: 0,
            time_remaining: 0.0,
            active: false,
            last_outcome: Outcome::Failure,
        }
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    pub fn current_wave_index(&self) -> usize {
        self.current_wave_index
    }

    pub fn current_wave(&self) -> &Wave {
        &self.waves[self.current_wave_index]
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_outcome(&self) -> Outcome {
        self.last_outcome
    }
}
