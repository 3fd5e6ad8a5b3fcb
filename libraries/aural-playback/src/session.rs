//! Playback sessions
//!
//! A session is one committed attempt to play a specific track. The render
//! engine tags everything it reports with the session it was started under;
//! anything tagged with a session that is no longer current is dropped.

use crate::types::IndexedTrack;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// The active session and the track it plays
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: SessionId,
    track: IndexedTrack,
}

impl PlaybackSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn track(&self) -> &IndexedTrack {
        &self.track
    }
}

/// Owns the current session
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Option<PlaybackSession>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `track`, replacing any current one
    pub fn begin(&mut self, track: IndexedTrack) -> SessionId {
        let id = SessionId::next();
        self.current = Some(PlaybackSession { id, track });
        id
    }

    /// Re-issue the current session under a fresh id
    ///
    /// Used when the engine is re-scheduled for the same track (seek), so
    /// end-of-stream reports from the old schedule no longer match.
    pub fn renew(&mut self) -> Option<SessionId> {
        let session = self.current.as_mut()?;
        session.id = SessionId::next();
        Some(session.id)
    }

    /// End the current session, returning it
    pub fn end(&mut self) -> Option<PlaybackSession> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&PlaybackSession> {
        self.current.as_ref()
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.current.as_ref().is_some_and(|s| s.id == id)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}
