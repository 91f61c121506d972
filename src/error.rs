use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a wave set or driving the controller.
///
/// Everything except `InvalidIndex` is a configuration problem found at load
/// time; a controller is never built from a config that fails validation.
/// Timer expiry and unfinished keys are normal outcomes, not errors.
#[derive(Debug, Error)]
pub enum QteError {
    #[error("configuration has no waves")]
    NoWaves,

    #[error("wave {wave} has no keys")]
    EmptyWave { wave: usize },

    #[error("wave {wave} has an invalid time limit: {seconds}")]
    InvalidTimeLimit { wave: usize, seconds: f64 },

    #[error("invalid key movement speed: {0}")]
    InvalidKeysSpeed(f32),

    #[error("unknown key code: {0:?}")]
    UnknownKeyCode(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("failed to read wave file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse wave file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("wave index {index} out of range (have {len} waves)")]
    InvalidIndex { index: usize, len: usize },
}

impl QteError {
    /// True for the load-time class of errors that make the controller refuse to start.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, QteError::InvalidIndex { .. })
    }
}

pub type Result<T> = std::result::Result<T, QteError>;
