//! Playback controller - the playback state machine
//!
//! Owns the playback state and the current session, and coordinates the
//! sequence provider, catalog, prep cache, render engine, prefetch scheduler
//! and notification bus.
//!
//! Every method runs in the caller's context. The render engine reports
//! end-of-track through a bounded channel which the owner drains with
//! [`PlaybackController::process_render_events`], so completions are applied
//! in the same serialized context as every other transition.

use crate::{
    catalog::{PlaylistChange, TrackCatalog},
    error::{PlaybackError, PreparationError, Result},
    events::{NotificationBus, PlayerNotification, RenderEvent, RenderEventReceiver},
    prefetch::{CandidateSet, PrefetchScheduler},
    prep::PrepCache,
    render::{AudioRenderEngine, RenderState},
    seek::{self, SeekPosition, SeekTarget},
    sequence::SequenceProvider,
    session::{SessionId, SessionTracker},
    types::{
        IndexedTrack, PlaybackConfig, PlaybackState, RepeatMode, SequenceModes, ShuffleMode,
        TrackHandle,
    },
};
use std::sync::Arc;
use std::time::Duration;

/// Everything the controller drives
pub struct Collaborators {
    pub sequence: Box<dyn SequenceProvider>,
    pub catalog: Arc<dyn TrackCatalog>,
    pub prep_cache: Arc<dyn PrepCache>,
    pub engine: Box<dyn AudioRenderEngine>,
    /// Receiving end of the channel the engine reports into
    pub render_events: RenderEventReceiver,
}

/// Result of [`PlaybackController::toggle_play_pause`]
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub state: PlaybackState,
    pub playing_track: Option<IndexedTrack>,
    /// True if a new track was started (only possible from NoTrack)
    pub track_changed: bool,
}

/// Central playback control
pub struct PlaybackController {
    // State
    state: PlaybackState,
    sessions: SessionTracker,
    last_reported_position: Option<f64>,

    // Collaborators
    sequence: Box<dyn SequenceProvider>,
    catalog: Arc<dyn TrackCatalog>,
    prep_cache: Arc<dyn PrepCache>,
    engine: Box<dyn AudioRenderEngine>,
    render_events: RenderEventReceiver,
    notifications: NotificationBus,

    // Prefetch
    prefetch: Option<PrefetchScheduler>,
    candidates: CandidateSet,

    // Settings
    seek_step_secs: f64,
}

impl PlaybackController {
    /// Create a controller
    ///
    /// Applies the configured repeat/shuffle modes to the sequence and, if
    /// prefetching is enabled, spawns the prefetch worker.
    pub fn new(
        collaborators: Collaborators,
        config: &PlaybackConfig,
        notifications: NotificationBus,
    ) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            mut sequence,
            catalog,
            prep_cache,
            engine,
            render_events,
        } = collaborators;

        sequence.set_repeat_mode(config.repeat);
        sequence.set_shuffle_mode(config.shuffle);

        let prefetch = if config.prefetch_enabled {
            Some(PrefetchScheduler::new(
                prep_cache.clone(),
                config.prefetch_queue_capacity,
            )?)
        } else {
            None
        };

        Ok(Self {
            state: PlaybackState::NoTrack,
            sessions: SessionTracker::new(),
            last_reported_position: None,
            sequence,
            catalog,
            prep_cache,
            engine,
            render_events,
            notifications,
            prefetch,
            candidates: CandidateSet::new(),
            seek_step_secs: config.seek_step_secs,
        })
    }

    // ===== Playback Control =====

    /// Play/pause toggle
    ///
    /// From NoTrack, starts whatever the sequence says plays next (nothing,
    /// for an empty playlist). Paused resumes, Playing pauses.
    pub fn toggle_play_pause(&mut self) -> Result<ToggleOutcome> {
        let mut track_changed = false;

        match self.state {
            PlaybackState::NoTrack => {
                track_changed = self.subsequent_track()?.is_some();
            }
            PlaybackState::Paused => self.resume(),
            PlaybackState::Playing => self.pause(),
        }

        Ok(ToggleOutcome {
            state: self.state,
            playing_track: self.playing_track(),
            track_changed,
        })
    }

    /// Play the track at `index`
    ///
    /// Always stops the current session first, even when `index` is the
    /// playing track. Preparation happens inline if the track is not warm.
    pub fn play(&mut self, index: usize) -> Result<IndexedTrack> {
        self.stop();

        let track = self
            .catalog
            .peek_track_at(Some(index))
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;

        self.sequence.select(index);
        self.start_track(&track)?;
        Ok(track)
    }

    /// Play `index` unless that would interrupt playback the caller did not
    /// mean to interrupt
    ///
    /// Without `interrupt_playback` this only plays from NoTrack; otherwise it
    /// returns `Ok(None)` and changes nothing.
    pub fn play_with_interrupt(
        &mut self,
        index: usize,
        interrupt_playback: bool,
    ) -> Result<Option<IndexedTrack>> {
        if interrupt_playback || self.state == PlaybackState::NoTrack {
            return self.play(index).map(Some);
        }
        Ok(None)
    }

    /// Stop playback; no-op without a track
    pub fn stop(&mut self) {
        if self.state == PlaybackState::NoTrack {
            return;
        }

        if let Some(session) = self.sessions.end() {
            tracing::debug!(session = %session.id(), track = %session.track().id(), "Ending session");
        }
        self.engine.stop();
        self.engine.reset();
        self.state = PlaybackState::NoTrack;
        self.last_reported_position = None;
    }

    /// Skip forward; `Ok(None)` and no change if nothing follows
    pub fn next_track(&mut self) -> Result<Option<IndexedTrack>> {
        let target = self.sequence.next();
        self.skip_to(target)
    }

    /// Skip back; `Ok(None)` and no change if nothing precedes
    pub fn previous_track(&mut self) -> Result<Option<IndexedTrack>> {
        let target = self.sequence.previous();
        self.skip_to(target)
    }

    fn skip_to(&mut self, target: Option<usize>) -> Result<Option<IndexedTrack>> {
        let Some(track) = self.catalog.peek_track_at(target) else {
            return Ok(None);
        };
        self.start_track(&track)?;
        Ok(Some(track))
    }

    fn pause(&mut self) {
        self.engine.pause();
        self.state = PlaybackState::Paused;
    }

    fn resume(&mut self) {
        self.engine.resume();
        self.state = PlaybackState::Playing;
    }

    /// Stop, then prepare and start `track` under a new session
    fn start_track(&mut self, track: &IndexedTrack) -> std::result::Result<(), PreparationError> {
        self.stop();

        if !self.prep_cache.is_prepared(&track.track) {
            tracing::debug!(track = %track.id(), "Preparing selected track inline");
            self.prep_cache.prepare(&track.track)?;
        }

        let session = self.sessions.begin(track.clone());
        self.engine.start(&track.track, session);
        self.state = PlaybackState::Playing;

        tracing::info!(
            track = %track.id(),
            index = track.index,
            %session,
            "Started track"
        );

        self.refresh_prefetch();
        Ok(())
    }

    /// Start whatever the sequence plays after the current track
    fn subsequent_track(&mut self) -> std::result::Result<Option<IndexedTrack>, PreparationError> {
        let target = self.sequence.subsequent();
        let track = self.catalog.peek_track_at(target);

        match &track {
            Some(track) => self.start_track(track)?,
            None => self.stop(),
        }
        Ok(track)
    }

    /// The current track finished, naturally or by seeking to its end
    fn track_playback_completed(&mut self) {
        self.stop();

        match self.subsequent_track() {
            Ok(track) => {
                tracing::debug!(
                    track = ?track.as_ref().map(|t| t.id().as_str()),
                    "Advanced after track completion"
                );
                self.notifications
                    .publish(PlayerNotification::TrackChanged(track));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not start next track");
                self.notifications
                    .publish(PlayerNotification::PlaybackFailed(err));
            }
        }
    }

    // ===== Render Events =====

    /// Apply pending render-engine events
    ///
    /// Events from sessions that are no longer current are discarded.
    /// Returns the number of events applied.
    pub fn process_render_events(&mut self) -> usize {
        let mut applied = 0;

        while let Some(event) = self.render_events.try_next() {
            if !self.sessions.is_current(event.session()) {
                tracing::debug!(session = %event.session(), "Discarding stale render event");
                continue;
            }

            applied += 1;
            match event {
                RenderEvent::TrackCompleted { .. } => self.track_playback_completed(),
                RenderEvent::Position { seconds, .. } => {
                    self.last_reported_position = Some(seconds);
                }
            }
        }

        applied
    }

    // ===== Seek =====

    /// Seek forward by the configured step; reaching the end completes the track
    pub fn seek_forward(&mut self) {
        let Some((track, current)) = self.seekable() else {
            return;
        };
        let target = seek::forward(current, self.seek_step_secs, track.duration_secs());
        self.apply_seek(&track, target);
    }

    /// Seek backward by the configured step
    pub fn seek_backward(&mut self) {
        let Some((track, current)) = self.seekable() else {
            return;
        };
        let target = seek::backward(current, self.seek_step_secs);
        self.apply_seek(&track, target);
    }

    /// Seek to `percentage` of the track; 100 or more completes the track
    pub fn seek_to_percentage(&mut self, percentage: f64) {
        let Some((track, _)) = self.seekable() else {
            return;
        };
        let target = seek::to_percentage(percentage, track.duration_secs());
        self.apply_seek(&track, target);
    }

    /// Current position; zero without a track
    pub fn seek_position(&self) -> SeekPosition {
        match self.sessions.current() {
            Some(session) => seek::position(
                self.position_seconds(),
                session.track().track.duration_secs(),
            ),
            None => SeekPosition::default(),
        }
    }

    /// The playing track and the position to seek from, while Playing
    fn seekable(&self) -> Option<(TrackHandle, f64)> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let session = self.sessions.current()?;
        Some((session.track().track.clone(), self.position_seconds()))
    }

    fn apply_seek(&mut self, track: &TrackHandle, target: SeekTarget) {
        match target {
            SeekTarget::Position(seconds) => {
                // Re-scheduling gets a fresh session so an end-of-stream
                // queued for the old schedule is dropped
                if let Some(session) = self.sessions.renew() {
                    self.engine.seek_to_time(track, seconds, session);
                    self.last_reported_position = Some(seconds);
                }
            }
            SeekTarget::TrackEnd => self.track_playback_completed(),
        }
    }

    fn position_seconds(&self) -> f64 {
        self.engine
            .current_position_seconds()
            .or(self.last_reported_position)
            .unwrap_or(0.0)
    }

    // ===== Sequencing Modes =====

    pub fn toggle_repeat_mode(&mut self) -> SequenceModes {
        let modes = self.sequence.toggle_repeat_mode();
        self.refresh_prefetch();
        modes
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> SequenceModes {
        let modes = self.sequence.set_repeat_mode(mode);
        self.refresh_prefetch();
        modes
    }

    pub fn toggle_shuffle_mode(&mut self) -> SequenceModes {
        let modes = self.sequence.toggle_shuffle_mode();
        self.refresh_prefetch();
        modes
    }

    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> SequenceModes {
        let modes = self.sequence.set_shuffle_mode(mode);
        self.refresh_prefetch();
        modes
    }

    pub fn sequence_modes(&self) -> SequenceModes {
        self.sequence.modes()
    }

    // ===== Playlist Hooks =====

    pub fn track_added(&mut self) {
        self.sequence.on_playlist_change(&PlaylistChange::TrackAdded);
        self.refresh_prefetch();
    }

    /// The track at `index` was removed from the catalog
    ///
    /// Removing the playing track stops playback.
    pub fn track_removed(&mut self, index: usize) {
        self.sequence
            .on_playlist_change(&PlaylistChange::TrackRemoved { index });
        if !self.playing_track_in_catalog() {
            tracing::info!(index, "Playing track was removed");
            self.stop();
        }
        if self.catalog.size() > 0 {
            self.refresh_prefetch();
        } else {
            self.candidates = CandidateSet::new();
        }
    }

    pub fn track_reordered(&mut self, from: usize, to: usize) {
        self.sequence
            .on_playlist_change(&PlaylistChange::TrackReordered { from, to });
        self.refresh_prefetch();
    }

    pub fn playlist_reordered(&mut self, cursor: Option<usize>) {
        self.sequence
            .on_playlist_change(&PlaylistChange::PlaylistReordered { cursor });
        self.refresh_prefetch();
    }

    pub fn playlist_cleared(&mut self) {
        self.sequence
            .on_playlist_change(&PlaylistChange::PlaylistCleared);
        self.candidates = CandidateSet::new();
    }

    /// Dispatch a [`PlaylistChange`] to the matching hook
    pub fn playlist_changed(&mut self, change: PlaylistChange) {
        match change {
            PlaylistChange::TrackAdded => self.track_added(),
            PlaylistChange::TrackRemoved { index } => self.track_removed(index),
            PlaylistChange::TrackReordered { from, to } => self.track_reordered(from, to),
            PlaylistChange::PlaylistReordered { cursor } => self.playlist_reordered(cursor),
            PlaylistChange::PlaylistCleared => self.playlist_cleared(),
        }
    }

    // ===== Prefetch =====

    /// Recompute the candidate set and queue anything not yet warm
    fn refresh_prefetch(&mut self) {
        let playing = self.sessions.current().map(|s| s.track().id().clone());
        self.candidates = CandidateSet::compute(
            self.sequence.as_ref(),
            self.catalog.as_ref(),
            playing.as_ref(),
        );

        if let Some(prefetch) = &self.prefetch {
            let queued = prefetch.submit_all(&self.candidates);
            tracing::debug!(
                candidates = ?self.candidates.indices(),
                queued,
                "Refreshed prefetch candidates"
            );
        }
    }

    /// The most recently computed prefetch candidates
    pub fn prefetch_candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Prefetch tasks queued or in flight
    pub fn prefetch_pending(&self) -> usize {
        self.prefetch.as_ref().map_or(0, PrefetchScheduler::pending)
    }

    /// Wait for the prefetch worker to go idle; false on timeout
    pub fn wait_for_prefetch(&self, timeout: Duration) -> bool {
        match &self.prefetch {
            Some(prefetch) => prefetch.wait_idle(timeout),
            None => true,
        }
    }

    // ===== State Queries =====

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    /// The playing (or paused) track
    ///
    /// The index follows the sequence cursor when the cursor still points at
    /// the same track, so it survives playlist reorders.
    pub fn playing_track(&self) -> Option<IndexedTrack> {
        let session = self.sessions.current()?;
        let at_cursor = self
            .catalog
            .peek_track_at(self.sequence.cursor())
            .filter(|track| track.id() == session.track().id());
        Some(at_cursor.unwrap_or_else(|| session.track().clone()))
    }

    /// False when the playing track is no longer where the catalog says
    fn playing_track_in_catalog(&self) -> bool {
        match self.playing_track() {
            Some(playing) => self
                .catalog
                .peek_track_at(Some(playing.index))
                .is_some_and(|track| track.id() == playing.id()),
            None => true,
        }
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.sessions.current().map(|s| s.id())
    }

    pub fn render_state(&self) -> RenderState {
        self.engine.state()
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    pub fn seek_step_secs(&self) -> f64 {
        self.seek_step_secs
    }

    // ===== Lifecycle =====

    /// Stop playback, stop the prefetch worker and close the notification bus
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(prefetch) = self.prefetch.as_mut() {
            prefetch.shutdown();
        }
        self.notifications.close();
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
