//! Mandatory desire from the route.

use lmrs_core::{Param, ParameterResult, RelativeLane};
use lmrs_perception::InfrastructureRecord;

use crate::{Desire, IncentiveContext};

/// Desire to leave a lane from which `n` lane changes must be completed
/// within `x` metres, at speed `v`.
///
///   max(1 − x/(n·lookahead), 1 − (x/v)/(n·t0)), clamped to [0, 1]
///
/// No required change gives 0; no distance left gives 1 at any speed.
pub fn leave_desire(x: f64, n: u32, v: f64, lookahead: f64, t0: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if x <= 0.0 {
        return 1.0;
    }
    let n = n as f64;
    let by_distance = 1.0 - x / (n * lookahead);
    let by_time = if v > 0.0 { 1.0 - (x / v) / (n * t0) } else { f64::NEG_INFINITY };
    by_distance.max(by_time).clamp(0.0, 1.0)
}

/// Desire to move to an adjacent lane, from the leave desires of the
/// current lane and that lane.
pub fn move_desire(current: f64, adjacent: f64) -> f64 {
    if adjacent < current {
        current
    } else if adjacent > current {
        -adjacent
    } else {
        0.0
    }
}

pub(super) fn desire(ctx: &IncentiveContext<'_>) -> ParameterResult<Desire> {
    let lookahead = ctx.params.get(Param::Lookahead)?;
    let t0 = ctx.params.get(Param::T0)?;
    let v = ctx.snapshot.speed();

    let leave = |r: &InfrastructureRecord| leave_desire(r.remaining_distance, r.required_changes, v, lookahead, t0);
    let current = leave(ctx.snapshot.current_infrastructure());
    let side = |lane: RelativeLane| {
        ctx.snapshot
            .infrastructure(lane)
            .map_or(0.0, |r| move_desire(current, leave(r)))
    };

    Ok(Desire::new(side(RelativeLane::Left), side(RelativeLane::Right)))
}
