//! File probing
//!
//! Building tracks from paths and preparing them for playback. Both read the
//! file's tags and audio properties with lofty.

use aural_playback::{PreparationError, Track, TrackHandle, TrackPreparer};
use lofty::{AudioFile, ItemKey, TaggedFileExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Builds playlist tracks from file paths
#[derive(Debug, Clone)]
pub struct TrackLoader {
    fallback_duration: Duration,
}

impl TrackLoader {
    pub fn new(fallback_duration: Duration) -> Self {
        Self { fallback_duration }
    }

    /// Read title and duration from `path`
    ///
    /// Unreadable files still produce a track (titled after the file, with
    /// the fallback duration); preparation reports the problem when played.
    pub fn load(&self, path: &Path) -> TrackHandle {
        let (title, duration) = match lofty::read_from_path(path) {
            Ok(file) => {
                let title = file
                    .primary_tag()
                    .or_else(|| file.tags().first())
                    .and_then(|tag| tag.get_string(&ItemKey::TrackTitle))
                    .map(str::to_string);
                (title, file.properties().duration())
            }
            Err(err) => {
                tracing::debug!(path = ?path, error = %err, "Could not read tags");
                (None, Duration::ZERO)
            }
        };

        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });
        let duration = if duration.is_zero() {
            self.fallback_duration
        } else {
            duration
        };

        Arc::new(Track::new(
            path.display().to_string(),
            path,
            title,
            duration,
        ))
    }
}

/// Prepares tracks by checking they can be opened and parsed
#[derive(Debug, Clone)]
pub struct FileProbe {
    extensions: Vec<String>,
}

impl FileProbe {
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    fn is_supported(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|e| self.extensions.contains(&e))
    }
}

impl TrackPreparer for FileProbe {
    fn prepare(&self, track: &Track) -> Result<(), PreparationError> {
        if !self.is_supported(&track.path) {
            return Err(PreparationError::UnsupportedFormat(
                extension_of(&track.path).unwrap_or_else(|| "no extension".to_string()),
            ));
        }

        std::fs::File::open(&track.path).map_err(|e| PreparationError::Unreadable {
            path: track.path.clone(),
            reason: e.to_string(),
        })?;

        lofty::read_from_path(&track.path).map_err(|e| PreparationError::Decode(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn probe() -> FileProbe {
        FileProbe::new(vec!["flac".to_string(), "MP3".to_string()])
    }

    #[test]
    fn unsupported_extension_is_rejected_before_io() {
        let track = Track::new("x", "/nowhere/song.xm", "Song", Duration::from_secs(1));
        assert_eq!(
            probe().prepare(&track),
            Err(PreparationError::UnsupportedFormat("xm".to_string()))
        );
    }

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(probe().is_supported(Path::new("/music/a.mp3")));
        assert!(probe().is_supported(Path::new("/music/a.FLAC")));
        assert!(!probe().is_supported(Path::new("/music/a")));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.flac");
        let track = Track::new("gone", path.clone(), "Gone", Duration::from_secs(1));

        match probe().prepare(&track) {
            Err(PreparationError::Unreadable { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Unreadable, got {other:?}"),
        }
    }

    #[test]
    fn loader_falls_back_for_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Night Drive.flac");
        fs::write(&path, b"not really audio").unwrap();

        let track = TrackLoader::new(Duration::from_secs(42)).load(&path);

        assert_eq!(track.title, "Night Drive");
        assert_eq!(track.duration, Duration::from_secs(42));
        assert_eq!(track.path, path);
    }
}
