//! Game settings and preferences
//!
//! Read-only to the game core; the settings screen owns writes.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistError, Storage};
use crate::sim::Difficulty;

/// Ring color themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VisualPreset {
    #[default]
    Classic,
    Neon,
    Mono,
}

impl VisualPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualPreset::Classic => "Classic",
            VisualPreset::Neon => "Neon",
            VisualPreset::Mono => "Mono",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(VisualPreset::Classic),
            "neon" => Some(VisualPreset::Neon),
            "mono" | "monochrome" => Some(VisualPreset::Mono),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Speed curve
    pub difficulty: Difficulty,
    /// Run a fresh 3-2-1-GO after every miss
    pub restart_after_loss: bool,

    // === Audio ===
    pub music_enabled: bool,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    pub haptics_enabled: bool,
    pub visual_preset: VisualPreset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            restart_after_loss: false,
            music_enabled: true,
            music_volume: 0.7,
            haptics_enabled: true,
            visual_preset: VisualPreset::Classic,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "ring_tap_settings";

    /// Music volume to actually play at
    pub fn effective_music_volume(&self) -> f32 {
        if self.music_enabled {
            self.music_volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Load settings, falling back to defaults
    pub fn load(storage: &dyn Storage) -> Self {
        match persistence::load(storage, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PersistError> {
        persistence::store(storage, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
