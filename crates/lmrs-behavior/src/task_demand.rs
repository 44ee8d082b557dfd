//! Cognitive task demand per channel.
//!
//! Three channels, each a scalar in [0, 1] recomputed every epoch:
//!
//! | Channel        | Source                                               |
//! |----------------|------------------------------------------------------|
//! | headway        | time headway to the current-lane leader              |
//! | lane changing  | synthesized desire of this epoch                     |
//! | distraction    | road-side distraction segments the ego is inside     |
//!
//! The lane-changing channel depends on synthesized desire, so the planner
//! estimates headway and distraction first, synthesizes, then fills in lane
//! changing with [`TaskDemand::with_lane_changing`].

use lmrs_core::{Param, ParameterResult, ParameterSet, RelativeLane};
use lmrs_perception::{task_headway, Snapshot};

use crate::Desire;

/// Headway above which the car-following task stays at its floor, seconds.
const RELAXED_HEADWAY: f64 = 3.0;

/// Demand of the car-following task at and beyond [`RELAXED_HEADWAY`].
const RELAXED_DEMAND: f64 = 0.5;

/// Reference deceleration scale in the minimum-headway correction, m/s².
const DECELERATION_SCALE: f64 = 8.0;

/// Per-channel task demand for one epoch.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskDemand {
    pub headway:       f64,
    pub lane_changing: f64,
    pub distraction:   f64,
}

impl TaskDemand {
    /// Headway and distraction channels; lane changing left at zero.
    pub fn estimate(snapshot: &Snapshot, params: &ParameterSet) -> ParameterResult<Self> {
        let t_min = params.get(Param::Tmin)?;
        let b = params.get(Param::B)?;
        let ego = snapshot.ego();
        let h = task_headway(snapshot.leaders(RelativeLane::Current), ego.speed);
        Ok(Self {
            headway:       headway_demand(h, ego.acceleration, b, t_min),
            lane_changing: 0.0,
            distraction:   distraction_demand(snapshot),
        })
    }

    pub fn with_lane_changing(mut self, desire: &Desire) -> Self {
        self.lane_changing = lane_changing_demand(desire);
        self
    }

    /// Load that suppresses discretionary lane changes.  Lane changing is
    /// excluded: it is itself driven by desire.
    #[inline]
    pub fn load(&self) -> f64 {
        self.headway.max(self.distraction)
    }
}

/// Minimum time headway under the current acceleration: braking harder than
/// the comfortable deceleration stretches it beyond `t_min`.
pub fn min_task_headway(acceleration: f64, b: f64, t_min: f64) -> f64 {
    if acceleration < -b && b < DECELERATION_SCALE {
        t_min * (1.0 - (acceleration + b) / (DECELERATION_SCALE - b))
    } else {
        t_min
    }
}

/// Demand of the car-following task for time headway `h` (`None` without a
/// leader).
pub fn headway_demand(h: Option<f64>, acceleration: f64, b: f64, t_min: f64) -> f64 {
    let Some(h) = h else {
        return 0.0;
    };
    let h_min = min_task_headway(acceleration, b, t_min);
    if h <= h_min {
        1.0
    } else if h > RELAXED_HEADWAY || h_min >= RELAXED_HEADWAY {
        RELAXED_DEMAND
    } else {
        1.0 - RELAXED_DEMAND * (h - h_min) / (RELAXED_HEADWAY - h_min)
    }
}

/// Demand of the lane-changing task: the larger positive desire.
#[inline]
pub fn lane_changing_demand(desire: &Desire) -> f64 {
    desire.max().max(0.0)
}

/// Largest distraction among segments the ego is currently inside.
pub fn distraction_demand(snapshot: &Snapshot) -> f64 {
    snapshot
        .current_distractions()
        .map(|d| d.value)
        .fold(0.0, f64::max)
}
