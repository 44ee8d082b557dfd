//! Courtesy toward faster traffic from behind.

use lmrs_core::{Param, ParameterResult, RelativeLane};
use lmrs_perception::PerceivedGtu;

use crate::{Desire, IncentiveContext};

/// A faster follower on the current lane pushes the ego right with
/// `SOCIO · (vF − v) / VGAIN`; a faster follower on the left lane holds it
/// back from moving left by the same measure.  Inactive below VCONG, where
/// nobody can overtake anyway.
pub(super) fn desire(ctx: &IncentiveContext<'_>, mandatory: Desire) -> ParameterResult<Desire> {
    let socio = ctx.params.get(Param::Socio)?;
    let v_gain = ctx.params.get(Param::Vgain)?;
    let v_cong = ctx.params.get(Param::Vcong)?;
    let v = ctx.snapshot.speed();
    if v < v_cong {
        return Ok(Desire::ZERO);
    }

    let pressure = |follower: Option<&PerceivedGtu>| {
        follower.map_or(0.0, |f| {
            let v_f = f.desired_speed.unwrap_or(f.speed);
            (socio * (v_f - v) / v_gain).clamp(0.0, 1.0)
        })
    };

    let right = if ctx.snapshot.lane_exists(RelativeLane::Right) && mandatory.right() >= 0.0 {
        pressure(ctx.snapshot.neighbors(RelativeLane::Current).first_follower())
    } else {
        0.0
    };
    let left = if ctx.snapshot.lane_exists(RelativeLane::Left) {
        -pressure(ctx.snapshot.neighbors(RelativeLane::Left).first_follower())
    } else {
        0.0
    };
    Ok(Desire::new(left, right))
}
