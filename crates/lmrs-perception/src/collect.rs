//! Collectors over distance-ordered neighbor sequences.
//!
//! Neighbor lists are sorted by ascending distance, so every question of the
//! form "what about the GTUs within x metres" can stop at the first GTU
//! beyond x.  [`Within`] is that early-terminating iterator; the free
//! functions are the folds the behavior layer runs over it.  Each call
//! creates a fresh iterator, so nothing is consumed across calls.

use std::iter::FusedIterator;
use std::slice;

use crate::PerceivedGtu;

// ── Within ────────────────────────────────────────────────────────────────────

/// Yields GTUs from a distance-sorted slice until the first one beyond
/// `range`, then stops for good.
#[derive(Clone, Debug)]
pub struct Within<'a> {
    inner: slice::Iter<'a, PerceivedGtu>,
    range: f64,
}

impl<'a> Within<'a> {
    pub fn new(sorted: &'a [PerceivedGtu], range: f64) -> Self {
        Self { inner: sorted.iter(), range }
    }
}

impl<'a> Iterator for Within<'a> {
    type Item = &'a PerceivedGtu;

    fn next(&mut self) -> Option<&'a PerceivedGtu> {
        let gtu = self.inner.next()?;
        if gtu.distance <= self.range {
            Some(gtu)
        } else {
            self.inner = Default::default();
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.inner.len()))
    }
}

impl FusedIterator for Within<'_> {}

// ── Folds ─────────────────────────────────────────────────────────────────────

/// Speed the ego may anticipate on a lane, given its leaders.
///
/// Each leader at distance `s` caps the anticipated speed at
/// `vl + (v_desired - vl) · s / lookahead`: its own speed when close, the
/// desired speed at the lookahead distance.  Leaders beyond the lookahead
/// are not visited.
pub fn anticipated_speed<'a, I>(leaders: I, desired_speed: f64, lookahead: f64) -> f64
where
    I: IntoIterator<Item = &'a PerceivedGtu>,
{
    leaders
        .into_iter()
        .take_while(|l| l.distance <= lookahead)
        .map(|l| {
            let s = l.distance.max(0.0);
            l.speed + (desired_speed - l.speed) * s / lookahead
        })
        .fold(desired_speed, f64::min)
}

/// Time headway to the first leader, using the ego speed cached for this
/// epoch.  `None` without a leader; infinite when the ego stands still.
pub fn task_headway(leaders: &[PerceivedGtu], ego_speed: f64) -> Option<f64> {
    let leader = leaders.first()?;
    if ego_speed <= 0.0 {
        return Some(f64::INFINITY);
    }
    Some(leader.distance.max(0.0) / ego_speed)
}
