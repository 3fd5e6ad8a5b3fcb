//! Seek arithmetic
//!
//! Everything here is in track-relative seconds. Frame positioning is the
//! render engine's business.

/// Where a seek lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// An in-bounds position, in seconds
    Position(f64),

    /// The end of the track; handled exactly like natural completion
    TrackEnd,
}

/// Current position within the playing track
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeekPosition {
    pub seconds: f64,
    pub percentage: f64,
}

/// Seek forward by `step` seconds
///
/// Reaching the duration exactly counts as the end of the track.
pub fn forward(current: f64, step: f64, duration: f64) -> SeekTarget {
    let target = duration.min(current + step);
    bounded(target, duration)
}

/// Seek backward by `step` seconds; never completes the track
pub fn backward(current: f64, step: f64) -> SeekTarget {
    SeekTarget::Position((current - step).max(0.0))
}

/// Seek to a percentage of the duration
pub fn to_percentage(percentage: f64, duration: f64) -> SeekTarget {
    let target = percentage.max(0.0) * duration / 100.0;
    bounded(target, duration)
}

/// Position report for `seconds` into a track of `duration` seconds
pub fn position(seconds: f64, duration: f64) -> SeekPosition {
    let seconds = seconds.clamp(0.0, duration.max(0.0));
    let percentage = if duration > 0.0 {
        seconds * 100.0 / duration
    } else {
        0.0
    };

    SeekPosition {
        seconds,
        percentage,
    }
}

fn bounded(target: f64, duration: f64) -> SeekTarget {
    if target < duration {
        SeekTarget::Position(target)
    } else {
        SeekTarget::TrackEnd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_within_track() {
        assert_eq!(forward(10.0, 5.0, 180.0), SeekTarget::Position(15.0));
    }

    #[test]
    fn forward_landing_exactly_on_end_completes() {
        assert_eq!(forward(175.0, 5.0, 180.0), SeekTarget::TrackEnd);
    }

    #[test]
    fn forward_past_end_completes() {
        assert_eq!(forward(178.5, 5.0, 180.0), SeekTarget::TrackEnd);
    }

    #[test]
    fn backward_clamps_at_zero() {
        assert_eq!(backward(3.0, 5.0), SeekTarget::Position(0.0));
        assert_eq!(backward(30.0, 5.0), SeekTarget::Position(25.0));
    }

    #[test]
    fn percentage_hundred_always_completes() {
        assert_eq!(to_percentage(100.0, 180.0), SeekTarget::TrackEnd);
        assert_eq!(to_percentage(250.0, 180.0), SeekTarget::TrackEnd);
        assert_eq!(to_percentage(100.0, 0.0), SeekTarget::TrackEnd);
    }

    #[test]
    fn percentage_within_track() {
        assert_eq!(to_percentage(50.0, 180.0), SeekTarget::Position(90.0));
        assert_eq!(to_percentage(-10.0, 180.0), SeekTarget::Position(0.0));
    }

    #[test]
    fn position_percentage() {
        let pos = position(45.0, 180.0);
        assert_eq!(pos.seconds, 45.0);
        assert_eq!(pos.percentage, 25.0);
    }

    #[test]
    fn position_of_zero_length_track() {
        assert_eq!(position(3.0, 0.0), SeekPosition::default());
    }
}
