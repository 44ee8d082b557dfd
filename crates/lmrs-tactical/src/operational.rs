//! The plan handed back to the scheduler.
//!
//! An [`OperationalPlan`] is a piecewise-constant acceleration profile over
//! its validity window, plus an optional lateral intent.  The profile never
//! drives the GTU backwards: a deceleration that would reach zero speed
//! inside the window is split into a stop segment and a standstill segment.

use lmrs_behavior::{Desire, TaskDemand};
use lmrs_core::{GtuId, LanePosition, LateralDirection, SimTime, TimeWindow, TurnIndicator};

/// Constant acceleration for `duration` seconds.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelerationSegment {
    pub duration:     f64,
    pub acceleration: f64,
}

/// A lane change started with this plan.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneChangeIntent {
    pub direction: LateralDirection,
    /// Time the lateral movement takes, seconds.
    pub duration:  f64,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlanKind {
    #[default]
    Regular,
    /// Maximum deceleration because perception was incomplete.
    Fallback,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationalPlan {
    pub gtu:            GtuId,
    pub window:         TimeWindow,
    pub start_location: LanePosition,
    pub start_speed:    f64,
    pub segments:       Vec<AccelerationSegment>,
    pub lane_change:    Option<LaneChangeIntent>,
    pub indicator:      TurnIndicator,
    /// Standing still inside a conflict.
    pub blocking:       bool,
    pub desire:         Desire,
    pub task_demand:    TaskDemand,
    pub kind:           PlanKind,
}

impl OperationalPlan {
    /// Longitudinal-only plan with constant `acceleration` over `window`.
    pub fn longitudinal(
        gtu:            GtuId,
        window:         TimeWindow,
        start_location: LanePosition,
        start_speed:    f64,
        acceleration:   f64,
    ) -> Self {
        Self {
            gtu,
            window,
            start_location,
            start_speed,
            segments:    profile(start_speed, acceleration, window.duration),
            lane_change: None,
            indicator:   TurnIndicator::OFF,
            blocking:    false,
            desire:      Desire::ZERO,
            task_demand: TaskDemand::default(),
            kind:        PlanKind::Regular,
        }
    }

    pub fn with_kind(mut self, kind: PlanKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub fn start_time(&self) -> SimTime {
        self.window.start
    }

    #[inline]
    pub fn end_time(&self) -> SimTime {
        self.window.end()
    }

    /// Acceleration at the start of the plan.
    pub fn acceleration(&self) -> f64 {
        self.segments.first().map_or(0.0, |s| s.acceleration)
    }

    #[inline]
    pub fn is_longitudinal_only(&self) -> bool {
        self.lane_change.is_none()
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.kind == PlanKind::Fallback
    }

    /// Acceleration `t` seconds into the plan (clamped to the window).
    pub fn acceleration_at(&self, t: f64) -> f64 {
        let mut elapsed = 0.0;
        for s in &self.segments {
            elapsed += s.duration;
            if t < elapsed {
                return s.acceleration;
            }
        }
        self.segments.last().map_or(0.0, |s| s.acceleration)
    }

    /// Speed `t` seconds into the plan (clamped to the window).
    pub fn speed_at(&self, t: f64) -> f64 {
        self.integrate(t).0
    }

    /// Distance travelled `t` seconds into the plan (clamped to the window).
    pub fn distance_at(&self, t: f64) -> f64 {
        self.integrate(t).1
    }

    pub fn end_speed(&self) -> f64 {
        self.speed_at(self.window.duration)
    }

    fn integrate(&self, t: f64) -> (f64, f64) {
        let mut remaining = t.clamp(0.0, self.window.duration);
        let (mut v, mut x) = (self.start_speed, 0.0);
        for s in &self.segments {
            let dt = remaining.min(s.duration);
            x += v * dt + 0.5 * s.acceleration * dt * dt;
            v = (v + s.acceleration * dt).max(0.0);
            remaining -= dt;
            if remaining <= 0.0 {
                break;
            }
        }
        (v, x)
    }
}

/// Segments for constant `acceleration` from `speed` over `duration`,
/// stopping at zero speed instead of reversing.
pub fn profile(speed: f64, acceleration: f64, duration: f64) -> Vec<AccelerationSegment> {
    let v = speed.max(0.0);
    if acceleration >= 0.0 || v + acceleration * duration >= 0.0 {
        return vec![AccelerationSegment { duration, acceleration }];
    }
    let t_stop = v / -acceleration;
    let mut segments = Vec::with_capacity(2);
    if t_stop > 0.0 {
        segments.push(AccelerationSegment { duration: t_stop, acceleration });
    }
    segments.push(AccelerationSegment { duration: duration - t_stop, acceleration: 0.0 });
    segments
}
