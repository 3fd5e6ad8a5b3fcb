//! Render engine abstraction
//!
//! The engine owns the actual signal path (decoding, effects, output). The
//! controller drives it through [`AudioRenderEngine`] and hears back only
//! through the render channel (see [`crate::events::render_channel`]); there
//! are no callbacks into the controller.

use crate::session::SessionId;
use crate::types::TrackHandle;

/// What the engine reports it is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Platform audio output driven by the controller
///
/// Implementors must tag every event they send with the session passed to
/// the most recent `start` / `seek_to_time`.
pub trait AudioRenderEngine: Send {
    /// Begin rendering `track` from its start
    fn start(&mut self, track: &TrackHandle, session: SessionId);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Stop rendering and drop any scheduled audio
    fn stop(&mut self);

    /// Return the signal path to a clean state
    ///
    /// Called after `stop`. Engines without residual state need not override.
    fn reset(&mut self) {}

    /// Re-schedule `track` from `seconds` under a fresh `session`
    fn seek_to_time(&mut self, track: &TrackHandle, seconds: f64, session: SessionId);

    /// Seconds into the current track, if the engine knows
    fn current_position_seconds(&self) -> Option<f64>;

    fn state(&self) -> RenderState;
}
