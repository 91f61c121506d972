use directories::ProjectDirs;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QteError, Result};
use crate::wave::Wave;

static PRESET_DIR: Dir = include_dir!("assets/waves");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QteConfig {
    /// Presses only count while the pointer is over the key's widget
    #[serde(default)]
    pub hover_gating: bool,
    /// Key widgets drift around the play area
    #[serde(default)]
    pub keys_move_randomly: bool,
    #[serde(default = "default_keys_speed")]
    pub keys_speed: f32,
    pub waves: Vec<Wave>,
}

fn default_keys_speed() -> f32 {
    5.0
}

impl Default for QteConfig {
    fn default() -> Self {
        Preset::Classic.load()
    }
}

impl QteConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.keys_speed.is_finite() || self.keys_speed < 0.0 {
            return Err(QteError::InvalidKeysSpeed(self.keys_speed));
        }
        validate_waves(&self.waves)
    }
}

/// Check a wave list before any controller is built from it
pub fn validate_waves(waves: &[Wave]) -> Result<()> {
    if waves.is_empty() {
        return Err(QteError::NoWaves);
    }
    for (idx, wave) in waves.iter().enumerate() {
        if wave.keys.is_empty() {
            return Err(QteError::EmptyWave { wave: idx });
        }
        if !wave.time_limit_secs.is_finite() || wave.time_limit_secs < 0.0 {
            return Err(QteError::InvalidTimeLimit {
                wave: idx,
                seconds: wave.time_limit_secs,
            });
        }
    }
    Ok(())
}

/// Wave sets shipped with the binary
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum, strum_macros::Display)]
pub enum Preset {
    #[default]
    Classic,
    Gauntlet,
}

impl Preset {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.to_string().to_lowercase())
    }

    pub fn try_load(&self) -> Result<QteConfig> {
        let name = self.file_name();
        let contents = PRESET_DIR
            .get_file(&name)
            .and_then(|f| f.contents_utf8())
            .ok_or_else(|| QteError::UnknownPreset(name.clone()))?;
        let cfg = QteConfig::from_json(contents).map_err(|source| QteError::Parse {
            path: PathBuf::from(name),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load an embedded preset; these are checked by the test suite
    pub fn load(&self) -> QteConfig {
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(err) => panic!("embedded preset {self} is invalid: {err}"),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<QteConfig>;
    fn save(&self, cfg: &QteConfig) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
    /// Missing file falls back to the classic preset instead of failing
    fallback: bool,
}

impl FileConfigStore {
    /// Store at the per-user config location, tolerant of a missing file
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "qte") {
            pd.config_dir().join("waves.json")
        } else {
            PathBuf::from("qte_waves.json")
        };
        Self {
            path,
            fallback: true,
        }
    }

    /// Store for an explicitly requested file; it must exist and be valid
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
            fallback: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<QteConfig> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if self.fallback && err.kind() == std::io::ErrorKind::NotFound => {
                return Preset::Classic.try_load();
            }
            Err(source) => {
                return Err(QteError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let cfg: QteConfig =
            serde_json::from_slice(&bytes).map_err(|source| QteError::Parse {
                path: self.path.clone(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn save(&self, cfg: &QteConfig) -> Result<()> {
        let io_err = |source| QteError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(|source| QteError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, data).map_err(io_err)
    }
}
