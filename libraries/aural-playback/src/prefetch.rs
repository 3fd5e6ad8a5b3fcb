//! Track prefetching
//!
//! Keeps the tracks most likely to play next prepared, so that starting them
//! does not stall on disk or decoder setup.
//!
//! ## Architecture
//!
//! ```text
//! Controller (caller context)        track-prep thread
//!        │                                  │
//!        │  submit(track)  (never blocks)   │
//!        │─────────────────────────────────>│
//!        │                                  │ PrepCache::prepare()
//!        │                                  │ (disk I/O, one at a time)
//!        │                                  │
//! ```
//!
//! A single worker runs tasks in submission order. A track that is already
//! prepared, queued or being prepared is not submitted again. Failures stay
//! on the worker; they resurface when the track is played for real.

use crate::catalog::TrackCatalog;
use crate::prep::PrepCache;
use crate::sequence::SequenceProvider;
use crate::types::{IndexedTrack, TrackHandle, TrackId};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Ordered set of prefetch candidates, keyed by track identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    tracks: IndexMap<TrackId, IndexedTrack>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks likely to play soon: subsequent, next and previous, in that
    /// order, minus the playing track and duplicates
    pub fn compute(
        sequence: &dyn SequenceProvider,
        catalog: &dyn TrackCatalog,
        playing: Option<&TrackId>,
    ) -> Self {
        let mut set = Self::new();
        let peeks = [
            sequence.peek_subsequent(),
            sequence.peek_next(),
            sequence.peek_previous(),
        ];

        for track in peeks.into_iter().filter_map(|i| catalog.peek_track_at(i)) {
            if Some(track.id()) != playing {
                set.insert(track);
            }
        }
        set
    }

    /// Add a candidate; returns false if the track is already present
    pub fn insert(&mut self, track: IndexedTrack) -> bool {
        if self.tracks.contains_key(track.id()) {
            return false;
        }
        self.tracks.insert(track.id().clone(), track);
        true
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.tracks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedTrack> {
        self.tracks.values()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(|t| t.index).collect()
    }
}

type QueuedSet = Arc<Mutex<HashSet<TrackId>>>;

fn lock(queued: &QueuedSet) -> MutexGuard<'_, HashSet<TrackId>> {
    queued.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-worker background preparation queue
pub struct PrefetchScheduler {
    /// Channel to the worker; `None` once shut down
    task_tx: Option<Sender<TrackHandle>>,
    /// Tracks queued or in flight
    queued: QueuedSet,
    cache: Arc<dyn PrepCache>,
    closed: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PrefetchScheduler {
    /// Spawn the worker thread
    ///
    /// At most `capacity` tasks wait in the queue; further submissions are
    /// dropped until it drains.
    pub fn new(cache: Arc<dyn PrepCache>, capacity: usize) -> std::io::Result<Self> {
        let (task_tx, task_rx) = bounded::<TrackHandle>(capacity.max(1));
        let queued: QueuedSet = Arc::default();
        let closed = Arc::new(AtomicBool::new(false));

        let worker = {
            let cache = cache.clone();
            let queued = queued.clone();
            let closed = closed.clone();
            thread::Builder::new()
                .name("track-prep".to_string())
                .spawn(move || Self::worker_loop(&task_rx, cache.as_ref(), &queued, &closed))?
        };

        Ok(Self {
            task_tx: Some(task_tx),
            queued,
            cache,
            closed,
            worker: Some(worker),
        })
    }

    /// Queue `track` for preparation (non-blocking)
    ///
    /// Returns true if a task was queued.
    pub fn submit(&self, track: &TrackHandle) -> bool {
        let Some(task_tx) = &self.task_tx else {
            return false;
        };
        if self.cache.is_prepared(track) || self.cache.has_failed(track) {
            return false;
        }

        let mut queued = lock(&self.queued);
        if !queued.insert(track.id.clone()) {
            return false;
        }

        match task_tx.try_send(track.clone()) {
            Ok(()) => {
                tracing::debug!(track = %track.id, "Queued track for preparation");
                true
            }
            Err(TrySendError::Full(_)) => {
                queued.remove(&track.id);
                tracing::warn!(track = %track.id, "Prefetch queue full, dropping request");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                queued.remove(&track.id);
                false
            }
        }
    }

    /// Submit every track in `candidates`; returns how many were queued
    pub fn submit_all(&self, candidates: &CandidateSet) -> usize {
        candidates
            .iter()
            .filter(|candidate| self.submit(&candidate.track))
            .count()
    }

    /// Tasks queued or in flight
    pub fn pending(&self) -> usize {
        lock(&self.queued).len()
    }

    /// Block until no task is pending, up to `timeout`
    ///
    /// Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    /// Stop accepting work and join the worker
    ///
    /// Queued tasks that have not started are discarded; one in flight is
    /// allowed to finish.
    pub fn shutdown(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.task_tx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Track prep worker exited abnormally");
            }
        }
        lock(&self.queued).clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.task_tx.is_none()
    }

    fn worker_loop(
        task_rx: &Receiver<TrackHandle>,
        cache: &dyn PrepCache,
        queued: &QueuedSet,
        closed: &AtomicBool,
    ) {
        tracing::debug!("Track prep worker started");

        while let Ok(track) = task_rx.recv() {
            let settled = cache.is_prepared(&track) || cache.has_failed(&track);
            if !closed.load(Ordering::SeqCst) && !settled {
                match panic::catch_unwind(AssertUnwindSafe(|| cache.prepare(&track))) {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::debug!(track = %track.id, error = %err, "Prefetch failed");
                    }
                    Err(_) => {
                        tracing::warn!(track = %track.id, "Prefetch panicked");
                    }
                }
            }
            lock(queued).remove(&track.id);
        }

        tracing::debug!("Track prep worker exiting");
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
