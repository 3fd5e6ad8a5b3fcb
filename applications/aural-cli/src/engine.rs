//! Simulated render engine
//!
//! Plays nothing; a wall clock stands in for the audio device. A
//! `render-clock` thread watches the clock and reports end-of-track and
//! periodic positions through the render channel, tagged with the session
//! the controller handed over.

use aural_playback::{AudioRenderEngine, RenderEventSender, RenderState, SessionId, TrackHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POSITION_REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct Clock {
    track: Option<TrackHandle>,
    session: Option<SessionId>,
    state: RenderState,
    /// Position when the clock last started running
    offset: f64,
    running_since: Option<Instant>,
    completed: bool,
}

impl Clock {
    fn position(&self) -> Option<f64> {
        self.track.as_ref()?;
        let running = self
            .running_since
            .map_or(0.0, |since| since.elapsed().as_secs_f64());
        Some(self.offset + running)
    }

    fn run_from(&mut self, seconds: f64) {
        self.offset = seconds;
        self.completed = false;
        self.running_since = (self.state == RenderState::Playing).then(Instant::now);
    }
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SimulatedEngine {
    clock: Arc<Mutex<Clock>>,
    running: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    /// Spawn the clock thread, checking every `tick`
    pub fn spawn(events: RenderEventSender, tick: Duration) -> std::io::Result<Self> {
        let clock = Arc::new(Mutex::new(Clock::default()));
        let running = Arc::new(AtomicBool::new(true));

        let ticker = {
            let clock = clock.clone();
            let running = running.clone();
            thread::Builder::new()
                .name("render-clock".to_string())
                .spawn(move || Self::tick_loop(&clock, &events, &running, tick))?
        };

        Ok(Self {
            clock,
            running,
            ticker: Some(ticker),
        })
    }

    fn tick_loop(
        clock: &Mutex<Clock>,
        events: &RenderEventSender,
        running: &AtomicBool,
        tick: Duration,
    ) {
        let mut last_report = Instant::now();

        while running.load(Ordering::SeqCst) {
            thread::sleep(tick);

            let mut clock = lock(clock);
            if clock.state != RenderState::Playing || clock.completed {
                continue;
            }
            let (Some(track), Some(session), Some(position)) =
                (clock.track.clone(), clock.session, clock.position())
            else {
                continue;
            };

            if position >= track.duration_secs() {
                clock.completed = true;
                events.track_completed(session);
            } else if last_report.elapsed() >= POSITION_REPORT_INTERVAL {
                events.position(session, position);
                last_report = Instant::now();
            }
        }

        tracing::debug!("Render clock stopped");
    }
}

impl AudioRenderEngine for SimulatedEngine {
    fn start(&mut self, track: &TrackHandle, session: SessionId) {
        let mut clock = lock(&self.clock);
        clock.track = Some(track.clone());
        clock.session = Some(session);
        clock.state = RenderState::Playing;
        clock.run_from(0.0);
    }

    fn pause(&mut self) {
        let mut clock = lock(&self.clock);
        if clock.state != RenderState::Playing {
            return;
        }
        clock.offset = clock.position().unwrap_or(0.0);
        clock.running_since = None;
        clock.state = RenderState::Paused;
    }

    fn resume(&mut self) {
        let mut clock = lock(&self.clock);
        if clock.state != RenderState::Paused {
            return;
        }
        clock.state = RenderState::Playing;
        clock.running_since = Some(Instant::now());
    }

    fn stop(&mut self) {
        *lock(&self.clock) = Clock::default();
    }

    fn seek_to_time(&mut self, track: &TrackHandle, seconds: f64, session: SessionId) {
        let mut clock = lock(&self.clock);
        clock.track = Some(track.clone());
        clock.session = Some(session);
        clock.run_from(seconds);
    }

    fn current_position_seconds(&self) -> Option<f64> {
        lock(&self.clock).position()
    }

    fn state(&self) -> RenderState {
        lock(&self.clock).state
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(ticker) = self.ticker.take() {
            if ticker.join().is_err() {
                tracing::warn!("Render clock thread exited abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aural_playback::{render_channel, IndexedTrack, RenderEvent, SessionTracker, Track};

    fn session_for(track: &TrackHandle) -> SessionId {
        SessionTracker::new().begin(IndexedTrack::new(0, track.clone()))
    }

    fn short_track(millis: u64) -> TrackHandle {
        Arc::new(Track::new("t", "/music/t.flac", "T", Duration::from_millis(millis)))
    }

    #[test]
    fn reports_completion_with_session() {
        let (tx, rx) = render_channel(8);
        let mut engine = SimulatedEngine::spawn(tx, Duration::from_millis(5)).unwrap();
        let track = short_track(30);
        let session = session_for(&track);

        engine.start(&track, session);

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut completed = None;
        while completed.is_none() && Instant::now() < deadline {
            if let Some(RenderEvent::TrackCompleted { session }) = rx.try_next() {
                completed = Some(session);
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(completed, Some(session));
    }

    #[test]
    fn pause_freezes_position() {
        let (tx, _rx) = render_channel(8);
        let mut engine = SimulatedEngine::spawn(tx, Duration::from_millis(50)).unwrap();
        let track = short_track(60_000);

        engine.start(&track, session_for(&track));
        engine.seek_to_time(&track, 12.0, session_for(&track));
        engine.pause();
        let frozen = engine.current_position_seconds().unwrap();
        thread::sleep(Duration::from_millis(20));

        assert_eq!(engine.current_position_seconds(), Some(frozen));
        assert!(frozen >= 12.0);
        assert_eq!(engine.state(), RenderState::Paused);
    }

    #[test]
    fn stop_clears_position() {
        let (tx, _rx) = render_channel(8);
        let mut engine = SimulatedEngine::spawn(tx, Duration::from_millis(50)).unwrap();
        let track = short_track(60_000);

        engine.start(&track, session_for(&track));
        engine.stop();

        assert_eq!(engine.current_position_seconds(), None);
        assert_eq!(engine.state(), RenderState::Idle);
    }
}
