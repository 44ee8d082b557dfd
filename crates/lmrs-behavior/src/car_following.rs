//! Longitudinal car-following.
//!
//! [`CarFollowingModel`] is the seam: the planner only needs a desired speed
//! and an acceleration toward (at most) one leader.  [`IdmPlus`] is the
//! default model:
//!
//!   a  = A · min(1 − (v/v0)^δ, 1 − (s*/s)²)
//!   s* = s0 + max(0, v·T + v·Δv / (2·√(A·B)))
//!
//! At steady state behind a leader at constant speed `v < v0` the gap
//! settles exactly at `s0 + v·T`.

use lmrs_core::{Param, ParameterResult, ParameterSet};
use lmrs_perception::PerceivedGtu;

/// Smallest gap fed into the interaction term, metres.
const MIN_GAP: f64 = 1e-3;

/// Smallest desired speed, m/s; avoids dividing by a zero speed limit.
const MIN_DESIRED_SPEED: f64 = 1e-3;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// The follower's side of a car-following evaluation.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Following {
    pub speed:             f64,
    pub desired_speed:     f64,
    /// Desired time headway T, seconds.
    pub time_headway:      f64,
    /// Standstill distance s0, metres.
    pub stopping_distance: f64,
}

impl Following {
    /// Regular following: `T0` and `S0` from `params`.
    pub fn new(params: &ParameterSet, speed: f64, desired_speed: f64) -> ParameterResult<Self> {
        Ok(Self {
            speed,
            desired_speed,
            time_headway:      params.get(Param::T0)?,
            stopping_distance: params.get(Param::S0)?,
        })
    }

    pub fn with_time_headway(mut self, time_headway: f64) -> Self {
        self.time_headway = time_headway;
        self
    }

    pub fn with_stopping_distance(mut self, stopping_distance: f64) -> Self {
        self.stopping_distance = stopping_distance;
        self
    }
}

/// Net gap to a leader and its speed.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct LeaderState {
    pub gap:   f64,
    pub speed: f64,
}

impl LeaderState {
    pub fn new(gap: f64, speed: f64) -> Self {
        Self { gap, speed }
    }

    /// A stationary obstacle `distance` ahead.
    pub fn standstill(distance: f64) -> Self {
        Self { gap: distance, speed: 0.0 }
    }
}

impl From<&PerceivedGtu> for LeaderState {
    fn from(g: &PerceivedGtu) -> Self {
        Self { gap: g.distance, speed: g.speed }
    }
}

// ── CarFollowingModel ─────────────────────────────────────────────────────────

/// A longitudinal driver model.
///
/// Implementations are stateless and shared by all planners, hence
/// `Send + Sync`.
pub trait CarFollowingModel: Send + Sync {
    /// Desired speed on a lane with the given speed limit.
    fn desired_speed(&self, params: &ParameterSet, speed_limit: f64) -> ParameterResult<f64>;

    /// Acceleration toward `leader`, or free-road acceleration for `None`.
    fn acceleration(
        &self,
        params:    &ParameterSet,
        following: Following,
        leader:    Option<LeaderState>,
    ) -> ParameterResult<f64>;

    /// Acceleration behind the first of a distance-sorted leader list.
    fn follow_leaders(
        &self,
        params:    &ParameterSet,
        following: Following,
        leaders:   &[PerceivedGtu],
    ) -> ParameterResult<f64> {
        self.acceleration(params, following, leaders.first().map(LeaderState::from))
    }

    /// Acceleration toward leaders on an adjacent lane.  Used defensively
    /// (lane change acceptance, synchronization), so never below `-BCRIT`.
    fn follow_defensive(
        &self,
        params:    &ParameterSet,
        following: Following,
        leaders:   &[PerceivedGtu],
    ) -> ParameterResult<f64> {
        let a = self.follow_leaders(params, following, leaders)?;
        Ok(a.max(-params.get(Param::Bcrit)?))
    }

    /// Acceleration to come to a stop `distance` ahead, treating the stop
    /// point as a stationary leader.
    fn stop(&self, params: &ParameterSet, following: Following, distance: f64) -> ParameterResult<f64> {
        self.acceleration(params, following, Some(LeaderState::standstill(distance)))
    }
}

// ── IdmPlus ───────────────────────────────────────────────────────────────────

/// The Intelligent Driver Model, "plus" variant: free-road and interaction
/// terms combine through `min` instead of a sum.
#[derive(Copy, Clone, Debug, Default)]
pub struct IdmPlus;

impl CarFollowingModel for IdmPlus {
    fn desired_speed(&self, params: &ParameterSet, speed_limit: f64) -> ParameterResult<f64> {
        let fspeed = params.get(Param::Fspeed)?;
        let vmax = params.get(Param::Vmax)?;
        Ok((fspeed * speed_limit).min(vmax))
    }

    fn acceleration(
        &self,
        params:    &ParameterSet,
        following: Following,
        leader:    Option<LeaderState>,
    ) -> ParameterResult<f64> {
        let a = params.get(Param::A)?;
        let b = params.get(Param::B)?;
        let delta = params.get(Param::Delta)?;

        let v = following.speed.max(0.0);
        let v0 = following.desired_speed.max(MIN_DESIRED_SPEED);
        let free = 1.0 - (v / v0).powf(delta);

        let Some(leader) = leader else {
            return Ok(a * free);
        };

        let dv = v - leader.speed;
        let dynamic = v * following.time_headway + v * dv / (2.0 * (a * b).sqrt());
        let s_star = following.stopping_distance + dynamic.max(0.0);
        let s = leader.gap.max(MIN_GAP);
        let interaction = 1.0 - (s_star / s).powi(2);

        Ok(a * free.min(interaction))
    }
}
