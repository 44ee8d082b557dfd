//! Lane change gap acceptance, synchronization and cooperation.
//!
//! All three use the desire-dependent headway
//!
//!   T(d) = d·TMIN + (1 − d)·T0,   d clamped to [0, 1]
//!
//! so the more a GTU wants to change, the shorter the gaps it accepts and
//! the harder it (or the GTU it merges in front of) may brake: down to
//! `−d·B`.  Following leaders on the target lane is defensive, bounded by
//! `−BCRIT`.

use std::{fmt, slice};

use lmrs_behavior::{Following, LeaderState};
use lmrs_conflict::{ConflictContext, ConflictEngine};
use lmrs_core::{IndicatorIntent, LateralDirection, Param, ParameterResult, ParameterSet, RelativeLane};
use lmrs_perception::PerceivedGtu;

use crate::TacticalResult;

/// `T(d)` for desire `desire`.
pub fn desire_headway(params: &ParameterSet, desire: f64) -> ParameterResult<f64> {
    let d = desire.clamp(0.0, 1.0);
    Ok(d * params.get(Param::Tmin)? + (1.0 - d) * params.get(Param::T0)?)
}

// ── Gap acceptance ────────────────────────────────────────────────────────────

/// Why a gap was turned down.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GapRejection {
    NoLane,
    /// Lane changes into the lane are not allowed here.
    Illegal,
    /// A GTU is alongside in the target lane.
    Occupied,
    /// The ego would brake harder than it accepts behind the new leader.
    Leader,
    /// The new follower would brake harder than it accepts.
    Follower,
    /// Conflicts on the target lane would need more than `BCRIT`.
    Conflict,
}

impl fmt::Display for GapRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GapRejection::NoLane   => "no lane",
            GapRejection::Illegal  => "illegal",
            GapRejection::Occupied => "occupied",
            GapRejection::Leader   => "leader",
            GapRejection::Follower => "follower",
            GapRejection::Conflict => "conflict",
        })
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum GapDecision {
    /// Ego acceleration behind the new leader.
    Accepted { acceleration: f64 },
    Rejected(GapRejection),
}

impl GapDecision {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GapDecision::Accepted { .. })
    }
}

/// Evaluate the gap toward `lat` for a GTU with lane change desire `desire`.
pub fn accept_gap(ctx: &ConflictContext<'_>, lat: LateralDirection, desire: f64) -> TacticalResult<GapDecision> {
    use GapDecision::Rejected;

    let snap = ctx.snapshot;
    let p = ctx.params;
    let lane = RelativeLane::from(lat);
    if lane == RelativeLane::Current {
        return Ok(Rejected(GapRejection::NoLane));
    }
    let Some(record) = snap.infrastructure(lane) else {
        return Ok(Rejected(GapRejection::NoLane));
    };
    if !record.change_allowed() {
        return Ok(Rejected(GapRejection::Illegal));
    }

    let neighbors = snap.neighbors(lane);
    let alongside = |g: Option<&PerceivedGtu>| g.is_some_and(|g| g.is_parallel());
    if alongside(neighbors.first_leader()) || alongside(neighbors.first_follower()) {
        return Ok(Rejected(GapRejection::Occupied));
    }

    let t = desire_headway(p, desire)?;
    let b_accept = -desire.clamp(0.0, 1.0) * p.get(Param::B)?;

    let own = Following::new(p, snap.speed(), ctx.desired_speed)?.with_time_headway(t);
    let a_own = ctx.model.follow_defensive(p, own, snap.leaders(lane))?;
    if a_own < b_accept {
        return Ok(Rejected(GapRejection::Leader));
    }

    if let Some(f) = neighbors.first_follower() {
        let v0 = match f.desired_speed {
            Some(v) => v,
            None => ctx.model.desired_speed(p, record.speed_limit)?,
        };
        let theirs = Following::new(p, f.speed, v0)?.with_time_headway(t);
        let a_follower = ctx.model.acceleration(p, theirs, Some(LeaderState::new(f.distance, snap.speed())))?;
        if a_follower < b_accept {
            return Ok(Rejected(GapRejection::Follower));
        }
    }

    if ConflictEngine.lane_acceleration(ctx, lane)? < -p.get(Param::Bcrit)? {
        return Ok(Rejected(GapRejection::Conflict));
    }

    Ok(GapDecision::Accepted { acceleration: a_own })
}

// ── Synchronization & cooperation ─────────────────────────────────────────────

/// Adapt to the first leader on the target lane to prepare a lane change
/// that cannot be made yet.  Never harder than `B`; unconstrained without a
/// leader.
pub fn synchronize(ctx: &ConflictContext<'_>, lat: LateralDirection, desire: f64) -> TacticalResult<f64> {
    let p = ctx.params;
    let lane = RelativeLane::from(lat);
    let Some(leader) = ctx.snapshot.neighbors(lane).first_leader() else {
        return Ok(f64::INFINITY);
    };
    if leader.is_parallel() {
        // Alongside: falling back behind it opens the gap.
        return Ok(-p.get(Param::B)?);
    }
    let following = Following::new(p, ctx.snapshot.speed(), ctx.desired_speed)?
        .with_time_headway(desire_headway(p, desire)?);
    let a = ctx.model.follow_defensive(p, following, slice::from_ref(leader))?;
    Ok(a.max(-p.get(Param::B)?))
}

/// Create a gap for the closest adjacent leader that indicates toward the
/// ego's lane.  Such a leader signals at least `DCOOP` desire, so the ego
/// follows it with that desire's headway, never braking harder than `B`.
pub fn cooperate(ctx: &ConflictContext<'_>) -> TacticalResult<f64> {
    let p = ctx.params;
    let d_coop = p.get(Param::Dcoop)?;
    let mut a = f64::INFINITY;
    for lat in [LateralDirection::Left, LateralDirection::Right] {
        let lane = RelativeLane::from(lat);
        if !ctx.snapshot.lane_exists(lane) {
            continue;
        }
        let toward_us = IndicatorIntent::from(lat.flip());
        let Some(leader) = ctx
            .snapshot
            .leaders(lane)
            .iter()
            .find(|g| !g.is_parallel() && g.indicator == toward_us)
        else {
            continue;
        };
        let following = Following::new(p, ctx.snapshot.speed(), ctx.desired_speed)?
            .with_time_headway(desire_headway(p, d_coop)?);
        let a_coop = ctx.model.acceleration(p, following, Some(LeaderState::from(leader)))?;
        a = a.min(a_coop.max(-p.get(Param::B)?));
    }
    Ok(a)
}
