//! Track preparation
//!
//! Preparing a track means doing the slow setup (metadata, decoder probing)
//! ahead of playback so that starting it is fast. Preparation is reachable
//! from two contexts, the caller's `play()` and the prefetch worker, so the
//! cache guarantees at most one preparation per track in flight: a second
//! request for a track being prepared waits for and reuses the first result.

use crate::error::PreparationError;
use crate::types::{Track, TrackId};
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Per-track "prepared" flag plus the means to prepare
pub trait PrepCache: Send + Sync {
    fn is_prepared(&self, track: &Track) -> bool;

    /// True if the last preparation of `track` failed
    fn has_failed(&self, track: &Track) -> bool;

    /// Prepare `track`; idempotent, returns immediately if already prepared
    ///
    /// A track whose last preparation failed is prepared again.
    fn prepare(&self, track: &Track) -> Result<(), PreparationError>;
}

/// The actual (slow) preparation work
pub trait TrackPreparer: Send + Sync {
    fn prepare(&self, track: &Track) -> Result<(), PreparationError>;
}

impl<F> TrackPreparer for F
where
    F: Fn(&Track) -> Result<(), PreparationError> + Send + Sync,
{
    fn prepare(&self, track: &Track) -> Result<(), PreparationError> {
        self(track)
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Preparing,
    Prepared,
    Failed(PreparationError),
}

/// Prep cache with per-track in-flight de-duplication
///
/// Failures are remembered so background prefetch can skip them
/// ([`PrepCache::has_failed`]); an explicit [`PrepCache::prepare`] retries.
pub struct TrackPrepCache<P> {
    preparer: P,
    slots: Mutex<HashMap<TrackId, Slot>>,
    settled: Condvar,
}

impl<P: TrackPreparer> TrackPrepCache<P> {
    pub fn new(preparer: P) -> Self {
        Self {
            preparer,
            slots: Mutex::new(HashMap::new()),
            settled: Condvar::new(),
        }
    }

    /// Drop whatever is known about `id`, allowing a retry
    ///
    /// A preparation in flight is left alone.
    pub fn forget(&self, id: &TrackId) {
        let mut slots = self.lock();
        if !matches!(slots.get(id), Some(Slot::Preparing)) {
            slots.remove(id);
        }
    }

    /// The remembered failure for `id`, if its last preparation failed
    pub fn failure(&self, id: &TrackId) -> Option<PreparationError> {
        match self.lock().get(id) {
            Some(Slot::Failed(err)) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn prepared_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Prepared))
            .count()
    }

    pub fn preparer(&self) -> &P {
        &self.preparer
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TrackId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, id: &TrackId, slot: Option<Slot>) {
        let mut slots = self.lock();
        match slot {
            Some(slot) => {
                slots.insert(id.clone(), slot);
            }
            None => {
                slots.remove(id);
            }
        }
        self.settled.notify_all();
    }
}

/// Clears a `Preparing` slot if the preparer unwinds, so waiters wake up
struct InFlight<'a, P: TrackPreparer> {
    cache: &'a TrackPrepCache<P>,
    id: &'a TrackId,
    done: bool,
}

impl<P: TrackPreparer> Drop for InFlight<'_, P> {
    fn drop(&mut self) {
        if !self.done {
            self.cache.settle(self.id, None);
        }
    }
}

impl<P: TrackPreparer> PrepCache for TrackPrepCache<P> {
    fn is_prepared(&self, track: &Track) -> bool {
        matches!(self.lock().get(&track.id), Some(Slot::Prepared))
    }

    fn has_failed(&self, track: &Track) -> bool {
        matches!(self.lock().get(&track.id), Some(Slot::Failed(_)))
    }

    fn prepare(&self, track: &Track) -> Result<(), PreparationError> {
        let mut slots = self.lock();
        loop {
            match slots.get(&track.id) {
                Some(Slot::Prepared) => return Ok(()),
                Some(Slot::Failed(err)) => {
                    tracing::debug!(
                        track = %track.id,
                        error = %err,
                        "Retrying failed preparation"
                    );
                    break;
                }
                Some(Slot::Preparing) => {
                    tracing::debug!(track = %track.id, "Waiting for in-flight preparation");
                    slots = self
                        .settled
                        .wait(slots)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => break,
            }
        }
        slots.insert(track.id.clone(), Slot::Preparing);
        drop(slots);

        let mut in_flight = InFlight {
            cache: self,
            id: &track.id,
            done: false,
        };

        let start = Instant::now();
        let result = self.preparer.prepare(track);
        in_flight.done = true;

        match &result {
            Ok(()) => {
                tracing::debug!(
                    track = %track.id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Prepared track"
                );
                self.settle(&track.id, Some(Slot::Prepared));
            }
            Err(err) => {
                tracing::debug!(track = %track.id, error = %err, "Track preparation failed");
                self.settle(&track.id, Some(Slot::Failed(err.clone())));
            }
        }

        result
    }
}
