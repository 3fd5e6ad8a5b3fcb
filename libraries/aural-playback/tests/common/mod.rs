//! Shared test doubles for controller integration tests
#![allow(dead_code)]

use aural_playback::{
    render_channel, AudioRenderEngine, Collaborators, NotificationBus, PlaybackConfig,
    PlaybackController, PlaybackSequence, PlayerNotification, Playlist, PreparationError,
    RenderEventSender, RenderState, RepeatMode, SessionId, ShuffleMode, Track, TrackHandle,
    TrackId, TrackPrepCache, TrackPreparer,
};
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Preparer =====

/// Counts preparations per track
///
/// Tracks titled "broken" always fail; tracks titled "flaky" fail on their
/// first preparation only.
#[derive(Default)]
pub struct CountingPreparer {
    calls: Mutex<HashMap<TrackId, usize>>,
}

impl CountingPreparer {
    pub fn calls(&self, id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&TrackId::from(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl TrackPreparer for CountingPreparer {
    fn prepare(&self, track: &Track) -> Result<(), PreparationError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(track.id.clone()).or_default();
            *count += 1;
            *count
        };

        match track.title.as_str() {
            "broken" => Err(PreparationError::Decode(format!("{} is truncated", track.id))),
            "flaky" if attempt == 1 => Err(PreparationError::Unreadable {
                path: track.path.clone(),
                reason: "file still being written".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

// ===== Render Engine =====

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Start { track: TrackId, session: SessionId },
    Pause,
    Resume,
    Stop,
    Seek { track: TrackId, seconds: f64, session: SessionId },
}

#[derive(Default)]
struct EngineLog {
    calls: Vec<EngineCall>,
    position: Option<f64>,
    state: RenderState,
}

/// Test-side view of a [`RecordingEngine`]
#[derive(Clone, Default)]
pub struct EngineProbe {
    log: Arc<Mutex<EngineLog>>,
}

impl EngineProbe {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().calls.clear();
    }

    pub fn set_position(&self, seconds: f64) {
        self.log.lock().unwrap().position = Some(seconds);
    }

    pub fn state(&self) -> RenderState {
        self.log.lock().unwrap().state
    }

    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Start { track, .. } => Some(track.0),
                _ => None,
            })
            .collect()
    }

    pub fn last_seek(&self) -> Option<(f64, SessionId)> {
        self.calls().into_iter().rev().find_map(|call| match call {
            EngineCall::Seek { seconds, session, .. } => Some((seconds, session)),
            _ => None,
        })
    }
}

/// Engine that records every command and plays nothing
pub struct RecordingEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl RecordingEngine {
    pub fn with_probe() -> (Self, EngineProbe) {
        let probe = EngineProbe::default();
        (
            Self {
                log: probe.log.clone(),
            },
            probe,
        )
    }

    fn record(&self, call: EngineCall) {
        self.log.lock().unwrap().calls.push(call);
    }
}

impl AudioRenderEngine for RecordingEngine {
    fn start(&mut self, track: &TrackHandle, session: SessionId) {
        self.record(EngineCall::Start {
            track: track.id.clone(),
            session,
        });
        let mut log = self.log.lock().unwrap();
        log.position = Some(0.0);
        log.state = RenderState::Playing;
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
        self.log.lock().unwrap().state = RenderState::Paused;
    }

    fn resume(&mut self) {
        self.record(EngineCall::Resume);
        self.log.lock().unwrap().state = RenderState::Playing;
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
        let mut log = self.log.lock().unwrap();
        log.position = None;
        log.state = RenderState::Idle;
    }

    fn seek_to_time(&mut self, track: &TrackHandle, seconds: f64, session: SessionId) {
        self.record(EngineCall::Seek {
            track: track.id.clone(),
            seconds,
            session,
        });
        self.log.lock().unwrap().position = Some(seconds);
    }

    fn current_position_seconds(&self) -> Option<f64> {
        self.log.lock().unwrap().position
    }

    fn state(&self) -> RenderState {
        self.log.lock().unwrap().state
    }
}

// ===== Harness =====

pub fn track(id: &str, title: &str, secs: u64) -> TrackHandle {
    Arc::new(Track::new(
        id,
        format!("/music/{id}.flac"),
        title,
        Duration::from_secs(secs),
    ))
}

/// Three 10-second tracks: a, b, c
pub fn abc() -> Vec<TrackHandle> {
    vec![track("a", "A", 10), track("b", "B", 10), track("c", "C", 10)]
}

pub struct Harness {
    pub controller: PlaybackController,
    pub playlist: Arc<Playlist>,
    pub cache: Arc<TrackPrepCache<CountingPreparer>>,
    pub engine: EngineProbe,
    pub render: RenderEventSender,
    pub notifications: Receiver<PlayerNotification>,
}

pub struct HarnessBuilder {
    tracks: Vec<TrackHandle>,
    config: PlaybackConfig,
    seed: u64,
}

impl HarnessBuilder {
    pub fn repeat(mut self, mode: RepeatMode) -> Self {
        self.config.repeat = mode;
        self
    }

    pub fn shuffle(mut self, mode: ShuffleMode) -> Self {
        self.config.shuffle = mode;
        self
    }

    pub fn prefetch(mut self, enabled: bool) -> Self {
        self.config.prefetch_enabled = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Harness {
        let playlist = Arc::new(Playlist::with_tracks(self.tracks.clone()));
        let cache = Arc::new(TrackPrepCache::new(CountingPreparer::default()));
        let (engine, probe) = RecordingEngine::with_probe();
        let (render, render_events) = render_channel(self.config.render_event_capacity);
        let bus = NotificationBus::new(self.config.notification_capacity);
        let notifications = bus.subscribe();

        let controller = PlaybackController::new(
            Collaborators {
                sequence: Box::new(PlaybackSequence::with_seed(
                    self.tracks.len(),
                    self.config.sequence_modes(),
                    self.seed,
                )),
                catalog: playlist.clone(),
                prep_cache: cache.clone(),
                engine: Box::new(engine),
                render_events,
            },
            &self.config,
            bus,
        )
        .expect("controller");

        Harness {
            controller,
            playlist,
            cache,
            engine: probe,
            render,
            notifications,
        }
    }
}

impl Harness {
    /// Prefetch disabled unless asked for, so preparation counts are exact
    pub fn builder(tracks: Vec<TrackHandle>) -> HarnessBuilder {
        HarnessBuilder {
            tracks,
            config: PlaybackConfig {
                prefetch_enabled: false,
                ..PlaybackConfig::default()
            },
            seed: 7,
        }
    }

    pub fn new(tracks: Vec<TrackHandle>) -> Self {
        Self::builder(tracks).build()
    }

    /// The engine reaches end-of-stream for the current session
    pub fn finish_current(&mut self) -> usize {
        if let Some(session) = self.controller.current_session() {
            assert!(self.render.track_completed(session));
        }
        self.controller.process_render_events()
    }

    pub fn playing_id(&self) -> Option<String> {
        self.controller
            .playing_track()
            .map(|t| t.id().as_str().to_string())
    }

    pub fn drain_notifications(&self) -> Vec<PlayerNotification> {
        self.notifications.try_iter().collect()
    }

    pub fn remove(&mut self, index: usize) {
        if self.playlist.remove(index).is_some() {
            self.controller.track_removed(index);
        }
    }

    pub fn add(&mut self, track: TrackHandle) {
        self.playlist.add(track);
        self.controller.track_added();
    }

    pub fn candidate_ids(&self) -> Vec<String> {
        self.controller
            .prefetch_candidates()
            .iter()
            .map(|t| t.id().as_str().to_string())
            .collect()
    }
}
