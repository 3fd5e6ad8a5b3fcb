/// CLI configuration
use crate::error::{CliError, Result};
use aural_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, read if present in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "aural.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_player")]
    pub player: PlayerSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerSettings {
    /// File extensions the probe accepts (lowercase, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Duration assumed for files whose length cannot be read
    #[serde(default = "default_fallback_track_secs")]
    pub fallback_track_secs: u64,

    /// Render clock resolution
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        default_player()
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `aural.toml` is used when
    /// present. `AURAL_*` variables override both, with `__` between
    /// sections (`AURAL_PLAYBACK__SEEK_STEP_SECS=10`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("AURAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        if self.player.extensions.is_empty() {
            return Err(CliError::Config(
                "At least one file extension must be accepted".to_string(),
            ));
        }

        if self.player.tick_millis == 0 {
            return Err(CliError::Config("tick_millis must be positive".to_string()));
        }

        Ok(())
    }
}

// Default values
fn default_player() -> PlayerSettings {
    PlayerSettings {
        extensions: default_extensions(),
        fallback_track_secs: default_fallback_track_secs(),
        tick_millis: default_tick_millis(),
    }
}

fn default_extensions() -> Vec<String> {
    ["mp3", "flac", "ogg", "opus", "m4a", "aac", "wav", "aiff"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_fallback_track_secs() -> u64 {
    180
}

fn default_tick_millis() -> u64 {
    100
}
