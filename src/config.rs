// Application configuration (RON)
//
// Read once at startup. A missing file means defaults; a malformed one is
// an error the caller reports before falling back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sequencer::metronome::{TempoConfig, clamp_volume};
use crate::sequencer::timeline::{Tempo, TimeSignature};

pub const CONFIG_DIR_NAME: &str = "practice_metronome";
pub const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Metronome defaults applied at startup
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MetronomeDefaults {
    pub bpm: i32,
    pub beats_per_bar: u8,
    pub note_value: u8,
    pub volume: f32,
}

impl Default for MetronomeDefaults {
    fn default() -> Self {
        Self {
            bpm: 120,
            beats_per_bar: 4,
            note_value: 4,
            volume: 0.8,
        }
    }
}

impl MetronomeDefaults {
    /// Same clamping as the runtime setters
    pub fn tempo_config(&self) -> TempoConfig {
        TempoConfig::new(
            Tempo::new(self.bpm),
            TimeSignature::new(self.beats_per_bar, self.note_value),
            clamp_volume(self.volume),
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub metronome: MetronomeDefaults,
    pub bpm_presets: Vec<u16>,
    /// JSON catalog of sequences; none means an empty catalog
    pub catalog_path: Option<PathBuf>,
    /// JSON weekly schedule; none means the built-in sample week
    pub schedule_path: Option<PathBuf>,
    /// Output device name; none means the system default
    pub audio_device: Option<String>,
    pub player_volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metronome: MetronomeDefaults::default(),
            bpm_presets: vec![60, 80, 100, 120, 140, 160, 180],
            catalog_path: None,
            schedule_path: None,
            audio_device: None,
            player_volume: 0.8,
        }
    }
}

impl AppConfig {
    /// Parse a RON document
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = ron::from_str(text)?;
        config.normalize();
        Ok(config)
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                log::info!("Loading config from {}", path.display());
                Self::from_ron(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load from the per-user config directory
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn normalize(&mut self) {
        self.player_volume = clamp_volume(self.player_volume);
        self.bpm_presets = self
            .bpm_presets
            .iter()
            .map(|bpm| Tempo::new(*bpm as i32).bpm())
            .collect();
        self.bpm_presets.dedup();
    }
}
