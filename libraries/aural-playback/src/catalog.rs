//! Track catalog
//!
//! Maps sequence indices to tracks. The controller only ever reads through
//! [`TrackCatalog`]; [`Playlist`] is an in-memory implementation whose
//! mutators report the [`PlaylistChange`] to hand to the controller.

use crate::types::{IndexedTrack, TrackHandle};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read access to the tracks being sequenced
pub trait TrackCatalog: Send + Sync {
    /// Track at `index`
    ///
    /// `None` for a missing index, one out of range, or one invalidated by a
    /// concurrent edit.
    fn peek_track_at(&self, index: Option<usize>) -> Option<IndexedTrack>;

    /// Number of tracks
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// A playlist edit, as seen by sequencing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistChange {
    /// A track was appended
    TrackAdded,

    /// The track at `index` was removed
    TrackRemoved { index: usize },

    /// One track moved from `from` to `to`
    TrackReordered { from: usize, to: usize },

    /// The whole playlist was reordered (e.g. sorted); the playing track now
    /// sits at `cursor`
    PlaylistReordered { cursor: Option<usize> },

    /// Every track was removed
    PlaylistCleared,
}

/// In-memory playlist
#[derive(Debug, Default)]
pub struct Playlist {
    tracks: RwLock<Vec<TrackHandle>>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: impl IntoIterator<Item = TrackHandle>) -> Self {
        Self {
            tracks: RwLock::new(tracks.into_iter().collect()),
        }
    }

    /// Append a track
    pub fn add(&self, track: TrackHandle) -> PlaylistChange {
        self.write().push(track);
        PlaylistChange::TrackAdded
    }

    /// Remove the track at `index`
    pub fn remove(&self, index: usize) -> Option<(TrackHandle, PlaylistChange)> {
        let mut tracks = self.write();
        if index >= tracks.len() {
            return None;
        }
        let track = tracks.remove(index);
        Some((track, PlaylistChange::TrackRemoved { index }))
    }

    /// Move the track at `from` to `to`
    pub fn reorder(&self, from: usize, to: usize) -> Option<PlaylistChange> {
        let mut tracks = self.write();
        if from >= tracks.len() || to >= tracks.len() {
            return None;
        }
        let track = tracks.remove(from);
        tracks.insert(to, track);
        Some(PlaylistChange::TrackReordered { from, to })
    }

    /// Sort by title, keeping track of where `playing` ends up
    pub fn sort_by_title(&self, playing: Option<usize>) -> PlaylistChange {
        let mut tracks = self.write();
        let playing_id = playing
            .and_then(|i| tracks.get(i))
            .map(|t| t.id.clone());

        tracks.sort_by(|a, b| a.title.cmp(&b.title));

        let cursor = playing_id.and_then(|id| tracks.iter().position(|t| t.id == id));
        PlaylistChange::PlaylistReordered { cursor }
    }

    /// Remove every track
    pub fn clear(&self) -> PlaylistChange {
        self.write().clear();
        PlaylistChange::PlaylistCleared
    }

    /// Snapshot of all tracks in order
    pub fn tracks(&self) -> Vec<TrackHandle> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<TrackHandle>> {
        self.tracks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TrackHandle>> {
        self.tracks.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TrackCatalog for Playlist {
    fn peek_track_at(&self, index: Option<usize>) -> Option<IndexedTrack> {
        let index = index?;
        self.read()
            .get(index)
            .map(|track| IndexedTrack::new(index, track.clone()))
    }

    fn size(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Track;
    use std::sync::Arc;
    use std::time::Duration;

    fn track(id: &str, title: &str) -> TrackHandle {
        Arc::new(Track::new(id, format!("/music/{id}.mp3"), title, Duration::from_secs(120)))
    }

    fn ids(playlist: &Playlist) -> Vec<String> {
        playlist.tracks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn peek_out_of_range_is_none() {
        let playlist = Playlist::with_tracks([track("a", "A")]);
        assert!(playlist.peek_track_at(None).is_none());
        assert!(playlist.peek_track_at(Some(1)).is_none());
        assert_eq!(playlist.peek_track_at(Some(0)).unwrap().id().as_str(), "a");
    }

    #[test]
    fn mutations_report_changes() {
        let playlist = Playlist::with_tracks([track("a", "A"), track("b", "B")]);

        assert_eq!(playlist.add(track("c", "C")), PlaylistChange::TrackAdded);
        assert_eq!(
            playlist.reorder(2, 0),
            Some(PlaylistChange::TrackReordered { from: 2, to: 0 })
        );
        assert_eq!(ids(&playlist), ["c", "a", "b"]);

        let (removed, change) = playlist.remove(1).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(change, PlaylistChange::TrackRemoved { index: 1 });
        assert!(playlist.remove(5).is_none());
        assert!(playlist.reorder(0, 9).is_none());

        assert_eq!(playlist.clear(), PlaylistChange::PlaylistCleared);
        assert!(playlist.is_empty());
    }

    #[test]
    fn sort_follows_playing_track() {
        let playlist =
            Playlist::with_tracks([track("z", "Zed"), track("m", "Mid"), track("a", "Alpha")]);
        let change = playlist.sort_by_title(Some(0));
        assert_eq!(change, PlaylistChange::PlaylistReordered { cursor: Some(2) });
        assert_eq!(ids(&playlist), ["a", "m", "z"]);
    }
}
