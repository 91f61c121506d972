// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires the terminal to these modules.
pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod input;
pub mod presentation;
pub mod runtime;
pub mod scoreboard;
pub mod session;
pub mod ui;
pub mod wave;

pub use config::{Preset, QteConfig};
pub use controller::{ControllerState, TickInput, TickReport, WaveController};
pub use error::QteError;
pub use presentation::{Presentation, WidgetHandle};
pub use wave::{Key, KeyCode, Outcome, Position, Wave};
