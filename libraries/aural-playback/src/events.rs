//! Playback events
//!
//! Two channels cross the controller's boundary:
//! - render events flow *in* from the render engine (end of track, position
//!   reports), tagged with the session they belong to
//! - notifications flow *out* to observers (track changed, playback failed)
//!
//! Both are bounded crossbeam channels. The controller drains render events
//! in its own context, so the state machine needs no lock.

use crate::error::PreparationError;
use crate::session::SessionId;
use crate::types::IndexedTrack;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Events reported by the render engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderEvent {
    /// The engine reached end-of-stream for the session's track
    TrackCompleted {
        session: SessionId,
    },

    /// Periodic position report, in seconds
    Position {
        session: SessionId,
        seconds: f64,
    },
}

impl RenderEvent {
    pub fn session(&self) -> SessionId {
        match self {
            RenderEvent::TrackCompleted { session } | RenderEvent::Position { session, .. } => {
                *session
            }
        }
    }
}

/// Engine-side handle of the render channel
#[derive(Debug, Clone)]
pub struct RenderEventSender {
    tx: Sender<RenderEvent>,
}

impl RenderEventSender {
    /// Report an event (non-blocking)
    ///
    /// Returns false if the channel is full or the controller is gone.
    pub fn send(&self, event: RenderEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "Render event channel full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn track_completed(&self, session: SessionId) -> bool {
        self.send(RenderEvent::TrackCompleted { session })
    }

    pub fn position(&self, session: SessionId, seconds: f64) -> bool {
        self.send(RenderEvent::Position { session, seconds })
    }
}

/// Controller-side handle of the render channel
#[derive(Debug)]
pub struct RenderEventReceiver {
    rx: Receiver<RenderEvent>,
}

impl RenderEventReceiver {
    /// Next pending event, if any (non-blocking)
    pub fn try_next(&self) -> Option<RenderEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of events waiting to be drained
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create the bounded channel from render engine to controller
pub fn render_channel(capacity: usize) -> (RenderEventSender, RenderEventReceiver) {
    let (tx, rx) = bounded(capacity);
    (RenderEventSender { tx }, RenderEventReceiver { rx })
}

/// Notifications published to observers
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNotification {
    /// The playing track changed after an automatic advance
    ///
    /// `None` means the sequence ended and nothing is playing.
    TrackChanged(Option<IndexedTrack>),

    /// An automatic advance could not start the next track
    PlaybackFailed(PreparationError),
}

#[derive(Debug)]
struct BusInner {
    subscribers: Vec<Sender<PlayerNotification>>,
    closed: bool,
}

/// Publish/subscribe handle for player notifications
///
/// Created alongside the controller and injected into it; cloning shares the
/// same subscriber list. Delivery is fire-and-forget: a full subscriber
/// misses the notification, a dropped one is pruned.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    inner: Arc<Mutex<BusInner>>,
    capacity: usize,
}

impl NotificationBus {
    /// Create a bus whose subscribers each buffer `capacity` notifications
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                subscribers: Vec::new(),
                closed: false,
            })),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber
    ///
    /// Subscribing to a closed bus yields an already-disconnected receiver.
    pub fn subscribe(&self) -> Receiver<PlayerNotification> {
        let (tx, rx) = bounded(self.capacity);
        let mut inner = self.lock();
        if !inner.closed {
            inner.subscribers.push(tx);
        }
        rx
    }

    /// Publish to every live subscriber (non-blocking)
    pub fn publish(&self, notification: PlayerNotification) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }

        inner
            .subscribers
            .retain(|tx| match tx.try_send(notification.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Notification subscriber is full, dropping notification");
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    /// Close the bus; subscribers observe disconnection once drained
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionTracker;
    use crate::types::Track;
    use std::time::Duration;

    fn indexed(index: usize, id: &str) -> IndexedTrack {
        IndexedTrack::new(
            index,
            Arc::new(Track::new(id, format!("/music/{id}.mp3"), id, Duration::from_secs(30))),
        )
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let bus = NotificationBus::new(4);
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(PlayerNotification::TrackChanged(Some(indexed(1, "b"))));

        for rx in [&first, &second] {
            match rx.try_recv().unwrap() {
                PlayerNotification::TrackChanged(Some(track)) => assert_eq!(track.index, 1),
                other => panic!("unexpected notification: {other:?}"),
            }
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = NotificationBus::new(4);
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(PlayerNotification::TrackChanged(None));

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), PlayerNotification::TrackChanged(None));
    }

    #[test]
    fn full_subscriber_misses_notification_without_blocking() {
        let bus = NotificationBus::new(1);
        let rx = bus.subscribe();

        bus.publish(PlayerNotification::TrackChanged(None));
        bus.publish(PlayerNotification::PlaybackFailed(PreparationError::Decode(
            "bad header".to_string(),
        )));

        assert_eq!(rx.len(), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn close_disconnects_subscribers() {
        let bus = NotificationBus::new(4);
        let rx = bus.subscribe();
        bus.close();

        bus.publish(PlayerNotification::TrackChanged(None));
        assert!(bus.is_closed());
        assert!(rx.recv().is_err());
        assert!(bus.subscribe().recv().is_err());
    }

    #[test]
    fn render_channel_carries_session_tag() {
        let mut sessions = SessionTracker::new();
        let session = sessions.begin(indexed(0, "a"));
        let (tx, rx) = render_channel(2);

        assert!(tx.track_completed(session));
        assert!(tx.position(session, 12.5));
        assert!(!tx.track_completed(session));
        assert_eq!(rx.len(), 2);

        let event = rx.try_next().unwrap();
        assert_eq!(event, RenderEvent::TrackCompleted { session });
        assert_eq!(rx.try_next().unwrap().session(), session);
        assert!(rx.try_next().is_none());
    }
}
