//! mzk-ap specific configuration

use crate::catalog::AudioQuality;
use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Playback engine configuration
///
/// Loaded from the `[player]` table of the TOML config file; every key is
/// optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Quality tier that earns the negotiation bonus
    pub preferred_quality: AudioQuality,
    /// Codec that earns the negotiation bonus
    pub preferred_codec: String,
    /// Upper bound on song/settings resolution per track change
    pub fetch_timeout_ms: u64,
    /// Event bus capacity per subscriber
    pub event_capacity: usize,
    /// SQLite file holding the persisted player state, relative to the data folder
    pub database_file: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            preferred_quality: AudioQuality::Medium,
            preferred_codec: "opus".to_string(),
            fetch_timeout_ms: 30_000,
            event_capacity: 256,
            database_file: PathBuf::from("player.db"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    player: PlayerConfig,
}

impl PlayerConfig {
    /// Load the `[player]` table from a config file, defaults for anything missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file: ConfigFile = mzk_common::config::load_toml_or_default(path)?;
        Ok(file.player)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Absolute database path inside `data_folder`
    pub fn database_path(&self, data_folder: &Path) -> PathBuf {
        if self.database_file.is_absolute() {
            self.database_file.clone()
        } else {
            data_folder.join(&self.database_file)
        }
    }
}
