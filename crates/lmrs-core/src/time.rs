//! Simulation time and plan validity windows.
//!
//! Unlike a tick-based loop, the external discrete-event scheduler hands the
//! planner arbitrary `f64` instants.  `SimTime` wraps those seconds so they
//! are not confused with durations, which stay bare `f64`.

use std::fmt;

use crate::LaneId;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation instant in seconds since the start of the run.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self`; negative if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}s", self.0)
    }
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// Half-open validity interval `[start, start + duration)` of a plan.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub start:    SimTime,
    pub duration: f64,
}

impl TimeWindow {
    pub fn new(start: SimTime, duration: f64) -> Self {
        Self { start, duration }
    }

    #[inline]
    pub fn end(&self) -> SimTime {
        self.start + self.duration
    }

    #[inline]
    pub fn contains(&self, t: SimTime) -> bool {
        t >= self.start && t < self.end()
    }
}

// ── LanePosition ──────────────────────────────────────────────────────────────

/// Where the GTU's reference point sits on the network at plan start.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LanePosition {
    pub lane:     LaneId,
    /// Longitudinal position along the lane centre line, metres.
    pub position: f64,
}

impl LanePosition {
    pub fn new(lane: LaneId, position: f64) -> Self {
        Self { lane, position }
    }
}
