//! Position history for movement prediction.

use std::collections::{BTreeMap, VecDeque};

use crate::math::{Fixed, Vec2Fixed};
use crate::unit::UnitId;

/// Samples kept per tracked unit.
pub const HISTORY_LEN: usize = 10;

/// Samples needed before a prediction is attempted.
pub const MIN_SAMPLES: usize = 3;

/// Recent `(time, position)` samples per unit.
///
/// Entries for units that stop being observed are evicted on the next
/// [`PositionMemory::observe`], so ids of dead units never accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMemory {
    tracks: BTreeMap<UnitId, VecDeque<(Fixed, Vec2Fixed)>>,
}

impl PositionMemory {
    /// Empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where each observed unit is at time `now`, forgetting units
    /// absent from `observed`.
    pub fn observe(&mut self, now: Fixed, observed: impl IntoIterator<Item = (UnitId, Vec2Fixed)>) {
        let mut seen = Vec::new();
        for (id, position) in observed {
            let track = self.tracks.entry(id).or_default();
            if track.len() == HISTORY_LEN {
                track.pop_front();
            }
            track.push_back((now, position));
            seen.push(id);
        }
        self.tracks.retain(|id, _| seen.contains(id));
    }

    /// Number of tracked units.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.tracks.len()
    }

    /// Samples held for `id`.
    #[must_use]
    pub fn samples(&self, id: UnitId) -> usize {
        self.tracks.get(&id).map_or(0, VecDeque::len)
    }

    /// Mean velocity across consecutive samples, if enough are held.
    #[must_use]
    pub fn velocity(&self, id: UnitId) -> Option<Vec2Fixed> {
        let track = self.tracks.get(&id).filter(|t| t.len() >= MIN_SAMPLES)?;
        let mut total = Vec2Fixed::ZERO;
        let mut count = 0;
        for ((t1, p1), (t2, p2)) in track.iter().zip(track.iter().skip(1)) {
            let dt = *t2 - *t1;
            if dt > Fixed::ZERO {
                let delta = *p2 - *p1;
                total += Vec2Fixed::new(delta.x / dt, delta.y / dt);
                count += 1;
            }
        }
        let count = Fixed::from_num(count);
        (count > Fixed::ZERO).then(|| Vec2Fixed::new(total.x / count, total.y / count))
    }

    /// Where `id`, now at `current`, will be after `horizon` seconds at its
    /// recent mean velocity. Without enough history this is `current`.
    #[must_use]
    pub fn predict(&self, id: UnitId, current: Vec2Fixed, horizon: Fixed) -> Vec2Fixed {
        self.velocity(id)
            .map_or(current, |v| current + v.scale(horizon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fixed_int;

    #[test]
    fn test_ring_buffer_caps_history() {
        let mut memory = PositionMemory::new();
        for i in 0..15 {
            memory.observe(fixed_int(i), [(7, Vec2Fixed::from_ints(i, 0))]);
        }
        assert_eq!(memory.samples(7), HISTORY_LEN);
    }

    #[test]
    fn test_absent_units_are_evicted() {
        let mut memory = PositionMemory::new();
        memory.observe(Fixed::ZERO, [(1, Vec2Fixed::ZERO), (2, Vec2Fixed::ZERO)]);
        memory.observe(Fixed::ONE, [(2, Vec2Fixed::ZERO)]);
        assert_eq!(memory.tracked(), 1);
        assert_eq!(memory.samples(1), 0);
    }

    #[test]
    fn test_predicts_along_mean_velocity() {
        let mut memory = PositionMemory::new();
        let id = 3;
        assert_eq!(memory.predict(id, Vec2Fixed::ZERO, Fixed::ONE), Vec2Fixed::ZERO);

        for i in 0..4 {
            memory.observe(fixed_int(i), [(id, Vec2Fixed::from_ints(10 * i, -5 * i))]);
        }
        let predicted = memory.predict(id, Vec2Fixed::from_ints(30, -15), fixed_int(2));
        assert_eq!(predicted, Vec2Fixed::from_ints(50, -25));
    }

    #[test]
    fn test_needs_minimum_history() {
        let mut memory = PositionMemory::new();
        memory.observe(Fixed::ZERO, [(1, Vec2Fixed::ZERO)]);
        memory.observe(Fixed::ONE, [(1, Vec2Fixed::from_ints(10, 0))]);
        assert_eq!(memory.velocity(1), None);
    }
}
