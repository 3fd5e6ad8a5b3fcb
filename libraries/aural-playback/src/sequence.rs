//! Sequencing policy
//!
//! [`SequenceProvider`] is the narrow interface the controller asks "what
//! plays next". [`PlaybackSequence`] implements it with repeat and shuffle:
//!
//! - `subsequent` is the automatic advance after a track ends: repeat One
//!   replays the current track, Off ends after the last track, All wraps.
//! - `next` / `previous` are user skips: they always move (repeat One acts
//!   like Off) and, at either end, leave the cursor alone unless repeat All
//!   wraps around.
//! - every `peek_*` answers the same question without moving anything.

use crate::catalog::PlaylistChange;
use crate::shuffle::{moved_index, ShuffleOrder};
use crate::types::{RepeatMode, SequenceModes, ShuffleMode};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Decides which sequence index plays next/previous
pub trait SequenceProvider: Send {
    /// Automatic advance after the current track finished
    fn subsequent(&mut self) -> Option<usize>;

    /// User-initiated skip forward
    fn next(&mut self) -> Option<usize>;

    /// User-initiated skip back
    fn previous(&mut self) -> Option<usize>;

    fn peek_subsequent(&self) -> Option<usize>;
    fn peek_next(&self) -> Option<usize>;
    fn peek_previous(&self) -> Option<usize>;

    /// Index of the current track
    fn cursor(&self) -> Option<usize>;

    /// Make `index` the current track (explicit selection)
    fn select(&mut self, index: usize);

    fn modes(&self) -> SequenceModes;
    fn toggle_repeat_mode(&mut self) -> SequenceModes;
    fn set_repeat_mode(&mut self, mode: RepeatMode) -> SequenceModes;
    fn toggle_shuffle_mode(&mut self) -> SequenceModes;
    fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> SequenceModes;

    /// The playlist being sequenced was edited
    fn on_playlist_change(&mut self, _change: &PlaylistChange) {}
}

/// Outcome of a sequencing step, computed before it is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Return `index` without moving
    Stay(usize),
    /// Move the cursor (and the shuffle position, when shuffling)
    Move { index: usize, position: Option<usize> },
    /// Start a fresh shuffle pass; the answer is not known until applied
    Reshuffle,
    /// The sequence is over; the cursor is cleared
    End,
    /// Nothing to move to; nothing changes
    Stuck,
}

impl Step {
    fn peek(self) -> Option<usize> {
        match self {
            Step::Stay(index) | Step::Move { index, .. } => Some(index),
            Step::Reshuffle | Step::End | Step::Stuck => None,
        }
    }
}

/// Repeat/shuffle sequence over `size` playlist indices
#[derive(Debug)]
pub struct PlaybackSequence {
    size: usize,
    cursor: Option<usize>,
    modes: SequenceModes,
    shuffle: ShuffleOrder,
    rng: StdRng,
}

impl PlaybackSequence {
    pub fn new(size: usize, modes: SequenceModes) -> Self {
        Self::with_rng(size, modes, StdRng::from_entropy())
    }

    /// Create with a fixed seed (deterministic shuffles)
    pub fn with_seed(size: usize, modes: SequenceModes, seed: u64) -> Self {
        Self::with_rng(size, modes, StdRng::seed_from_u64(seed))
    }

    fn with_rng(size: usize, modes: SequenceModes, mut rng: StdRng) -> Self {
        let shuffle = match modes.shuffle {
            ShuffleMode::Random => ShuffleOrder::generate(size, None, &mut rng),
            ShuffleMode::Off => ShuffleOrder::default(),
        };

        Self {
            size,
            cursor: None,
            modes,
            shuffle,
            rng,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn shuffling(&self) -> bool {
        self.modes.shuffle == ShuffleMode::Random
    }

    fn plan_subsequent(&self) -> Step {
        if self.size == 0 {
            return Step::Stuck;
        }
        if let (RepeatMode::One, Some(cursor)) = (self.modes.repeat, self.cursor) {
            return Step::Stay(cursor);
        }
        self.plan_forward(Step::End)
    }

    fn plan_next(&self) -> Step {
        if self.size == 0 {
            return Step::Stuck;
        }
        self.plan_forward(Step::Stuck)
    }

    /// Step forward; `at_end` is what happens past the last track without repeat All
    fn plan_forward(&self, at_end: Step) -> Step {
        if self.shuffling() {
            return match self.shuffle.peek_forward() {
                Some((position, index)) => Step::Move {
                    index,
                    position: Some(position),
                },
                None if self.modes.repeat == RepeatMode::All => Step::Reshuffle,
                None => at_end,
            };
        }

        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.size {
            Step::Move {
                index: next,
                position: None,
            }
        } else if self.modes.repeat == RepeatMode::All {
            Step::Move {
                index: 0,
                position: None,
            }
        } else {
            at_end
        }
    }

    fn plan_previous(&self) -> Step {
        let Some(cursor) = self.cursor else {
            return Step::Stuck;
        };
        let wrap = self.modes.repeat == RepeatMode::All;

        if self.shuffling() {
            return match self.shuffle.peek_back() {
                Some((position, index)) => Step::Move {
                    index,
                    position: Some(position),
                },
                None if wrap => self.shuffle.last().map_or(Step::Stuck, |(position, index)| {
                    Step::Move {
                        index,
                        position: Some(position),
                    }
                }),
                None => Step::Stuck,
            };
        }

        match cursor.checked_sub(1) {
            Some(prev) => Step::Move {
                index: prev,
                position: None,
            },
            None if wrap && self.size > 0 => Step::Move {
                index: self.size - 1,
                position: None,
            },
            None => Step::Stuck,
        }
    }

    fn apply(&mut self, step: Step) -> Option<usize> {
        match step {
            Step::Stay(index) => Some(index),
            Step::Move { index, position } => {
                self.cursor = Some(index);
                if self.shuffling() {
                    self.shuffle.set_position(position);
                }
                Some(index)
            }
            Step::Reshuffle => {
                self.shuffle = ShuffleOrder::generate_avoiding(self.size, self.cursor, &mut self.rng);
                self.shuffle.set_position(Some(0));
                self.cursor = self.shuffle.at(0);
                self.cursor
            }
            Step::End => {
                self.cursor = None;
                if self.shuffling() {
                    self.shuffle = ShuffleOrder::generate(self.size, None, &mut self.rng);
                }
                None
            }
            Step::Stuck => None,
        }
    }

    fn reshuffle_from_cursor(&mut self) {
        self.shuffle = ShuffleOrder::generate(self.size, self.cursor, &mut self.rng);
    }
}

impl SequenceProvider for PlaybackSequence {
    fn subsequent(&mut self) -> Option<usize> {
        let step = self.plan_subsequent();
        self.apply(step)
    }

    fn next(&mut self) -> Option<usize> {
        let step = self.plan_next();
        self.apply(step)
    }

    fn previous(&mut self) -> Option<usize> {
        let step = self.plan_previous();
        self.apply(step)
    }

    fn peek_subsequent(&self) -> Option<usize> {
        self.plan_subsequent().peek()
    }

    fn peek_next(&self) -> Option<usize> {
        self.plan_next().peek()
    }

    fn peek_previous(&self) -> Option<usize> {
        self.plan_previous().peek()
    }

    fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    fn select(&mut self, index: usize) {
        self.cursor = Some(index);
        if self.shuffling() {
            self.reshuffle_from_cursor();
        }
    }

    fn modes(&self) -> SequenceModes {
        self.modes
    }

    fn toggle_repeat_mode(&mut self) -> SequenceModes {
        self.set_repeat_mode(self.modes.repeat.toggled())
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) -> SequenceModes {
        self.modes.repeat = mode;
        self.modes
    }

    fn toggle_shuffle_mode(&mut self) -> SequenceModes {
        self.set_shuffle_mode(self.modes.shuffle.toggled())
    }

    fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> SequenceModes {
        if mode != self.modes.shuffle {
            self.modes.shuffle = mode;
            match mode {
                ShuffleMode::Random => self.reshuffle_from_cursor(),
                ShuffleMode::Off => self.shuffle = ShuffleOrder::default(),
            }
        }
        self.modes
    }

    fn on_playlist_change(&mut self, change: &PlaylistChange) {
        match *change {
            PlaylistChange::TrackAdded => {
                self.size += 1;
                if self.shuffling() {
                    self.shuffle.insert(self.size - 1, &mut self.rng);
                }
            }
            PlaylistChange::TrackRemoved { index } => {
                if index >= self.size {
                    return;
                }
                self.size -= 1;
                self.cursor = match self.cursor {
                    Some(c) if c == index => None,
                    Some(c) if c > index => Some(c - 1),
                    other => other,
                };
                if self.shuffling() {
                    self.shuffle.remove(index);
                }
            }
            PlaylistChange::TrackReordered { from, to } => {
                self.cursor = self.cursor.map(|c| moved_index(c, from, to));
                if self.shuffling() {
                    self.shuffle.reorder(from, to);
                }
            }
            PlaylistChange::PlaylistReordered { cursor } => {
                self.cursor = cursor;
                if self.shuffling() {
                    self.reshuffle_from_cursor();
                }
            }
            PlaylistChange::PlaylistCleared => {
                self.size = 0;
                self.cursor = None;
                self.shuffle = ShuffleOrder::default();
            }
        }
    }
}
