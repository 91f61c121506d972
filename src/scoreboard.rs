use crate::wave::Outcome;

/// Running tally of wave outcomes for the current process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub successes: u32,
    pub failures: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub cycles_completed: u32,
}

impl Scoreboard {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => {
                self.successes += 1;
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
            }
            Outcome::Failure => {
                self.failures += 1;
                self.streak = 0;
            }
        }
    }

    pub fn cycle_completed(&mut self) {
        self.cycles_completed += 1;
    }

    pub fn waves_played(&self) -> u32 {
        self.successes + self.failures
    }

    /// Success rate as a rounded percentage, None before any wave resolves
    pub fn success_rate(&self) -> Option<f64> {
        match self.waves_played() {
            0 => None,
            played => Some(((self.successes as f64 / played as f64) * 100.0).round()),
        }
    }

    pub fn summary(&self) -> String {
        let rate = self
            .success_rate()
            .map_or_else(|| "-".to_string(), |r| format!("{r}%"));
        format!(
            "{} cleared   {} failed   {} rate   streak {} (best {})",
            self.successes, self.failures, rate, self.streak, self.best_streak
        )
    }
}
