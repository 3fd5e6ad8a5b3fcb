//! Aural - Playback Control
//!
//! Platform-agnostic playback control for the Aural media player.
//!
//! This crate provides:
//! - The playback state machine (NoTrack / Playing / Paused)
//! - Playback sessions that tag render-engine events with the play they belong to
//! - Sequencing over a playlist (repeat Off/One/All, shuffle Off/Random)
//! - Seek arithmetic (step, percentage, position reporting)
//! - Prefetching of likely-next tracks on a background worker
//! - Notifications when playback advances on its own
//!
//! # Architecture
//!
//! `aural-playback` owns no audio I/O. The platform supplies:
//! - an [`AudioRenderEngine`] that renders tracks and reports end-of-track
//!   through a [`RenderEventSender`]
//! - a [`TrackCatalog`] resolving playlist indices to tracks
//! - a [`PrepCache`] that makes tracks ready to start
//!
//! All state changes run on the caller's thread. Events coming back from the
//! engine are queued and applied by [`PlaybackController::process_render_events`].
//!
//! # Example
//!
//! ```rust
//! use aural_playback::{
//!     render_channel, AudioRenderEngine, Collaborators, NotificationBus, PlaybackConfig,
//!     PlaybackController, PlaybackSequence, PlaybackState, Playlist, PreparationError,
//!     RenderState, SessionId, Track, TrackHandle, TrackPrepCache,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // A render engine that plays nothing
//! #[derive(Default)]
//! struct Silent {
//!     state: RenderState,
//! }
//!
//! impl AudioRenderEngine for Silent {
//!     fn start(&mut self, _track: &TrackHandle, _session: SessionId) {
//!         self.state = RenderState::Playing;
//!     }
//!     fn pause(&mut self) {
//!         self.state = RenderState::Paused;
//!     }
//!     fn resume(&mut self) {
//!         self.state = RenderState::Playing;
//!     }
//!     fn stop(&mut self) {
//!         self.state = RenderState::Idle;
//!     }
//!     fn seek_to_time(&mut self, _track: &TrackHandle, _seconds: f64, _session: SessionId) {}
//!     fn current_position_seconds(&self) -> Option<f64> {
//!         None
//!     }
//!     fn state(&self) -> RenderState {
//!         self.state
//!     }
//! }
//!
//! let playlist = Arc::new(Playlist::with_tracks([
//!     Arc::new(Track::new("a", "/music/a.flac", "A", Duration::from_secs(200))),
//!     Arc::new(Track::new("b", "/music/b.flac", "B", Duration::from_secs(180))),
//! ]));
//! let config = PlaybackConfig::default();
//! let (_render_tx, render_rx) = render_channel(config.render_event_capacity);
//!
//! let mut controller = PlaybackController::new(
//!     Collaborators {
//!         sequence: Box::new(PlaybackSequence::new(2, config.sequence_modes())),
//!         catalog: playlist,
//!         prep_cache: Arc::new(TrackPrepCache::new(|_: &Track| -> Result<(), PreparationError> {
//!             Ok(())
//!         })),
//!         engine: Box::new(Silent::default()),
//!         render_events: render_rx,
//!     },
//!     &config,
//!     NotificationBus::new(config.notification_capacity),
//! )
//! .unwrap();
//!
//! let outcome = controller.toggle_play_pause().unwrap();
//! assert_eq!(outcome.state, PlaybackState::Playing);
//! assert_eq!(controller.playing_track().map(|t| t.index), Some(0));
//! ```

mod catalog;
mod controller;
mod error;
mod events;
mod prefetch;
mod prep;
mod render;
pub mod seek;
mod sequence;
mod session;
mod shuffle;
pub mod types;

// Public exports
pub use catalog::{Playlist, PlaylistChange, TrackCatalog};
pub use controller::{Collaborators, PlaybackController, ToggleOutcome};
pub use error::{PlaybackError, PreparationError, Result};
pub use events::{
    render_channel, NotificationBus, PlayerNotification, RenderEvent, RenderEventReceiver,
    RenderEventSender,
};
pub use prefetch::{CandidateSet, PrefetchScheduler};
pub use prep::{PrepCache, TrackPrepCache, TrackPreparer};
pub use render::{AudioRenderEngine, RenderState};
pub use seek::{SeekPosition, SeekTarget};
pub use sequence::{PlaybackSequence, SequenceProvider};
pub use session::{PlaybackSession, SessionId, SessionTracker};
pub use shuffle::ShuffleOrder;
pub use types::{
    IndexedTrack, PlaybackConfig, PlaybackState, RepeatMode, SequenceModes, ShuffleMode, Track,
    TrackHandle, TrackId,
};
