use rand::Rng;

use crate::wave::Position;

/// Speed 1.0 crosses the whole play area in this many seconds
const SECONDS_PER_CROSSING: f32 = 20.0;

/// Random drift of a key box around its configured position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub pos: Position,
    pub vel: (f32, f32),
}

impl Drift {
    pub fn new(home: Position) -> Self {
        let mut rng = rand::thread_rng();
        let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        Self::with_heading(home, angle)
    }

    pub fn with_heading(home: Position, angle: f32) -> Self {
        Self {
            pos: home,
            vel: (angle.cos(), angle.sin()),
        }
    }

    /// Move by `dt` seconds at `speed`, bouncing off the play-area edges
    pub fn step(&mut self, dt: f32, speed: f32) {
        let scale = speed * 2.0 / SECONDS_PER_CROSSING * dt;
        let (x, vx) = bounce(self.pos.x + self.vel.0 * scale, self.vel.0);
        let (y, vy) = bounce(self.pos.y + self.vel.1 * scale, self.vel.1);
        self.pos.x = x;
        self.pos.y = y;
        self.vel = (vx, vy);
    }
}

fn bounce(p: f32, v: f32) -> (f32, f32) {
    if p > 1.0 {
        (2.0 - p, -v.abs())
    } else if p < -1.0 {
        (-2.0 - p, v.abs())
    } else {
        (p, v)
    }
}
