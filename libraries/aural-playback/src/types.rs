//! Core types for playback control

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Stable identity of a track
///
/// Prefetch de-duplication and the prep cache are keyed on this, never on
/// pointer identity of the handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A playable track
///
/// Immutable once created; preparation state lives in the prep cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// File path for decoding
    pub path: PathBuf,

    /// Display title
    pub title: String,

    /// Track duration
    pub duration: Duration,
}

impl Track {
    pub fn new(
        id: impl Into<TrackId>,
        path: impl Into<PathBuf>,
        title: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            title: title.into(),
            duration,
        }
    }

    /// Duration in seconds, the unit all seek arithmetic uses
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Shared handle to a track
pub type TrackHandle = Arc<Track>;

/// A track together with its position in the sequence
///
/// Only valid for the playlist revision it was looked up against.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTrack {
    pub index: usize,
    pub track: TrackHandle,
}

impl IndexedTrack {
    pub fn new(index: usize, track: TrackHandle) -> Self {
        Self { index, track }
    }

    pub fn id(&self) -> &TrackId {
        &self.track.id
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No session exists
    NoTrack,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the sequence ends
    #[default]
    Off,

    /// Loop current track only
    One,

    /// Loop entire sequence
    All,
}

impl RepeatMode {
    /// Next mode in the toggle cycle (Off -> One -> All -> Off)
    pub fn toggled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// Playlist order
    #[default]
    Off,

    /// Random order (Fisher-Yates)
    Random,
}

impl ShuffleMode {
    pub fn toggled(self) -> Self {
        match self {
            ShuffleMode::Off => ShuffleMode::Random,
            ShuffleMode::Random => ShuffleMode::Off,
        }
    }
}

/// Repeat and shuffle modes, as returned by every mode setter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceModes {
    pub repeat: RepeatMode,
    pub shuffle: ShuffleMode,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Seconds moved by seek forward/backward (default: 5)
    pub seek_step_secs: f64,

    /// Speculatively prepare likely-next tracks (default: true)
    pub prefetch_enabled: bool,

    /// Pending prefetch tasks before submissions are dropped (default: 16)
    pub prefetch_queue_capacity: usize,

    /// Render-engine events buffered before the engine sees a full channel (default: 32)
    pub render_event_capacity: usize,

    /// Notifications buffered per subscriber (default: 32)
    pub notification_capacity: usize,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle mode (default: Off)
    pub shuffle: ShuffleMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_step_secs: 5.0,
            prefetch_enabled: true,
            prefetch_queue_capacity: 16,
            render_event_capacity: 32,
            notification_capacity: 32,
            repeat: RepeatMode::Off,
            shuffle: ShuffleMode::Off,
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "seek_step_secs must be positive, got {}",
                self.seek_step_secs
            )));
        }

        let capacities = [
            ("prefetch_queue_capacity", self.prefetch_queue_capacity),
            ("render_event_capacity", self.render_event_capacity),
            ("notification_capacity", self.notification_capacity),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(PlaybackError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
        }

        Ok(())
    }

    pub fn sequence_modes(&self) -> SequenceModes {
        SequenceModes {
            repeat: self.repeat,
            shuffle: self.shuffle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.seek_step_secs, 5.0);
        assert!(config.prefetch_enabled);
        assert_eq!(config.repeat, RepeatMode::Off);
        assert_eq!(config.shuffle, ShuffleMode::Off);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_values() {
        let config = PlaybackConfig {
            seek_step_secs: 0.0,
            ..PlaybackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));

        let config = PlaybackConfig {
            render_event_capacity: 0,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{ "seek_step_secs": 10.0, "repeat": "all" }"#).unwrap();
        assert_eq!(config.seek_step_secs, 10.0);
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.prefetch_queue_capacity, 16);
    }

    #[test]
    fn repeat_toggle_cycles_through_all_modes() {
        assert_eq!(RepeatMode::Off.toggled(), RepeatMode::One);
        assert_eq!(RepeatMode::One.toggled(), RepeatMode::All);
        assert_eq!(RepeatMode::All.toggled(), RepeatMode::Off);
        assert_eq!(ShuffleMode::Off.toggled().toggled(), ShuffleMode::Off);
    }
}
