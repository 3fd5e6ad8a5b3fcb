//! Shuffle order for sequence randomization
//!
//! A shuffle order is a permutation of playlist indices (Fisher-Yates) plus
//! the position of the current track within it. Playlist edits remap the
//! permutation in place instead of reshuffling, so tracks already played in
//! this pass are not played again.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct ShuffleOrder {
    order: Vec<usize>,
    position: Option<usize>,
}

impl ShuffleOrder {
    /// Build a fresh permutation of `0..size`
    ///
    /// When `first` is given it is moved to the front and becomes current.
    pub fn generate(size: usize, first: Option<usize>, rng: &mut StdRng) -> Self {
        let mut order: Vec<usize> = (0..size).collect();
        order.shuffle(rng);

        let position = match first.and_then(|f| order.iter().position(|&i| i == f)) {
            Some(at) => {
                order.swap(0, at);
                Some(0)
            }
            None => None,
        };

        Self { order, position }
    }

    /// Build a permutation for a new pass that does not open with `avoid`
    ///
    /// Keeps a repeat-all reshuffle from playing the same track twice in a row.
    pub fn generate_avoiding(size: usize, avoid: Option<usize>, rng: &mut StdRng) -> Self {
        let mut next = Self::generate(size, None, rng);
        if size > 1 && next.order.first().copied() == avoid {
            let swap_with = rng.gen_range(1..size);
            next.order.swap(0, swap_with);
        }
        next
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<usize>) {
        self.position = position.filter(|&p| p < self.order.len());
    }

    /// Playlist index at `position` in the order
    pub fn at(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    /// Playlist index that follows the current one, if this pass has one
    pub fn peek_forward(&self) -> Option<(usize, usize)> {
        let next = self.position.map_or(0, |p| p + 1);
        self.at(next).map(|index| (next, index))
    }

    /// Playlist index that precedes the current one
    pub fn peek_back(&self) -> Option<(usize, usize)> {
        let prev = self.position?.checked_sub(1)?;
        self.at(prev).map(|index| (prev, index))
    }

    pub fn last(&self) -> Option<(usize, usize)> {
        let last = self.order.len().checked_sub(1)?;
        self.at(last).map(|index| (last, index))
    }

    /// A track was appended at playlist index `index`
    ///
    /// It lands at a random slot after the current position so it still
    /// plays during this pass.
    pub fn insert(&mut self, index: usize, rng: &mut StdRng) {
        let earliest = self.position.map_or(0, |p| p + 1);
        let slot = rng.gen_range(earliest..=self.order.len());
        self.order.insert(slot, index);
    }

    /// The track at playlist index `index` was removed
    ///
    /// Returns true if it was the current track.
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(slot) = self.order.iter().position(|&i| i == index) else {
            return false;
        };
        self.order.remove(slot);
        for i in &mut self.order {
            if *i > index {
                *i -= 1;
            }
        }

        match self.position {
            Some(p) if p == slot => {
                self.position = slot.checked_sub(1);
                true
            }
            Some(p) if p > slot => {
                self.position = Some(p - 1);
                false
            }
            _ => false,
        }
    }

    /// The track at playlist index `from` moved to `to`
    pub fn reorder(&mut self, from: usize, to: usize) {
        for i in &mut self.order {
            *i = moved_index(*i, from, to);
        }
    }
}

/// Where index `i` ends up after the element at `from` moves to `to`
pub fn moved_index(i: usize, from: usize, to: usize) -> usize {
    if i == from {
        to
    } else if from < to && i > from && i <= to {
        i - 1
    } else if from > to && i >= to && i < from {
        i + 1
    } else {
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn generate_is_a_permutation() {
        let order = ShuffleOrder::generate(20, None, &mut rng());
        let seen: HashSet<usize> = (0..order.len()).filter_map(|p| order.at(p)).collect();
        assert_eq!(seen.len(), 20);
        assert!(seen.iter().all(|&i| i < 20));
        assert_eq!(order.position(), None);
    }

    #[test]
    fn generate_with_first_starts_there() {
        let order = ShuffleOrder::generate(10, Some(6), &mut rng());
        assert_eq!(order.at(0), Some(6));
        assert_eq!(order.position(), Some(0));
    }

    #[test]
    fn generate_avoiding_never_opens_with_avoided_track() {
        let mut rng = rng();
        for _ in 0..50 {
            let order = ShuffleOrder::generate_avoiding(3, Some(1), &mut rng);
            assert_ne!(order.at(0), Some(1));
        }
    }

    #[test]
    fn removing_current_steps_position_back() {
        let mut order = ShuffleOrder::generate(5, Some(3), &mut rng());
        assert!(order.remove(3));
        assert_eq!(order.position(), None);
        assert_eq!(order.len(), 4);
        assert!((0..4).all(|p| order.at(p).unwrap() < 4));
    }

    #[test]
    fn inserted_track_plays_later_in_pass() {
        let mut rng = rng();
        let mut order = ShuffleOrder::generate(4, Some(2), &mut rng);
        order.insert(4, &mut rng);
        let slot = (0..order.len()).find(|&p| order.at(p) == Some(4)).unwrap();
        assert!(slot > 0);
    }

    #[test]
    fn moved_index_shifts_neighbours() {
        // [a b c d], move 0 -> 2 gives [b c a d]
        assert_eq!(moved_index(0, 0, 2), 2);
        assert_eq!(moved_index(1, 0, 2), 0);
        assert_eq!(moved_index(2, 0, 2), 1);
        assert_eq!(moved_index(3, 0, 2), 3);
        // move 3 -> 1 gives [a d b c]
        assert_eq!(moved_index(3, 3, 1), 1);
        assert_eq!(moved_index(1, 3, 1), 2);
        assert_eq!(moved_index(0, 3, 1), 0);
    }
}
