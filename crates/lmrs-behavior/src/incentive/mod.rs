//! The closed set of lane-change incentives.
//!
//! Each incentive maps the same [`Snapshot`] to a [`Desire`], independently
//! of the others.  Route is mandatory; the rest are voluntary and receive the
//! synthesized mandatory desire so they can stand down where the route
//! forbids a direction.
//!
//! | Incentive    | Kind      | Effect                                            |
//! |--------------|-----------|---------------------------------------------------|
//! | `Route`      | mandatory | leave lanes that do not continue along the route  |
//! | `Speed`      | voluntary | move toward faster lanes                          |
//! | `Keep`       | voluntary | keep right when nothing else matters              |
//! | `Hierarchal` | voluntary | make way for faster followers                     |
//! | `GetInLane`  | voluntary | join a queue early, avoid queues that merge back  |
//!
//! A parameter an incentive needs but cannot find makes that incentive
//! contribute zero desire for the epoch; the omission is logged.

mod get_in_lane;
mod hierarchal;
mod keep;
mod route;
mod speed;

use std::fmt;

use lmrs_core::{ParameterResult, ParameterSet, RelativeLane};
use lmrs_perception::{anticipated_speed, Snapshot};
use tracing::warn;

use crate::Desire;

pub use route::{leave_desire, move_desire};

// ── IncentiveContext ──────────────────────────────────────────────────────────

/// Read-only inputs shared by all incentives in one epoch.
#[derive(Copy, Clone, Debug)]
pub struct IncentiveContext<'a> {
    pub snapshot:      &'a Snapshot,
    pub params:        &'a ParameterSet,
    /// Ego desired speed on the current lane, m/s.
    pub desired_speed: f64,
}

impl<'a> IncentiveContext<'a> {
    pub fn new(snapshot: &'a Snapshot, params: &'a ParameterSet, desired_speed: f64) -> Self {
        Self { snapshot, params, desired_speed }
    }

    /// Speed the ego could anticipate on `lane` given its leaders there.
    pub(crate) fn anticipated_speed(&self, lane: RelativeLane, lookahead: f64) -> f64 {
        anticipated_speed(
            self.snapshot.neighbors(lane).leaders_within(lookahead),
            self.desired_speed,
            lookahead,
        )
    }
}

// ── Incentive ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Incentive {
    Route,
    Speed,
    Keep,
    Hierarchal,
    GetInLane,
}

impl Incentive {
    pub const VOLUNTARY: [Incentive; 4] =
        [Incentive::Speed, Incentive::Keep, Incentive::Hierarchal, Incentive::GetInLane];

    #[inline]
    pub fn is_mandatory(self) -> bool {
        matches!(self, Incentive::Route)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Incentive::Route      => "route",
            Incentive::Speed      => "speed",
            Incentive::Keep       => "keep",
            Incentive::Hierarchal => "hierarchal",
            Incentive::GetInLane  => "get-in-lane",
        }
    }

    /// Desire from this incentive alone.  `mandatory` is the combined
    /// mandatory desire of the epoch (zero while evaluating mandatory
    /// incentives).
    pub fn determine_desire(self, ctx: &IncentiveContext<'_>, mandatory: Desire) -> Desire {
        match self.try_determine_desire(ctx, mandatory) {
            Ok(desire) => desire,
            Err(e) => {
                warn!(gtu = %ctx.snapshot.gtu(), incentive = %self, error = %e, "incentive skipped");
                Desire::ZERO
            }
        }
    }

    fn try_determine_desire(self, ctx: &IncentiveContext<'_>, mandatory: Desire) -> ParameterResult<Desire> {
        match self {
            Incentive::Route      => route::desire(ctx),
            Incentive::Speed      => speed::desire(ctx),
            Incentive::Keep       => keep::desire(ctx, mandatory),
            Incentive::Hierarchal => hierarchal::desire(ctx, mandatory),
            Incentive::GetInLane  => get_in_lane::desire(ctx, mandatory),
        }
    }
}

impl fmt::Display for Incentive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
