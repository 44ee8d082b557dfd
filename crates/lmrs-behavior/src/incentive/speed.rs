//! Voluntary desire toward faster lanes.

use lmrs_core::{Param, ParameterResult, RelativeLane};

use crate::{Desire, IncentiveContext};

/// `(vAnt(target) − vAnt(current)) / VGAIN` per side, within [−1, 1].
/// Gaining speed on the right is ignored above VCONG: no undertaking in free
/// traffic.
pub(super) fn desire(ctx: &IncentiveContext<'_>) -> ParameterResult<Desire> {
    let lookahead = ctx.params.get(Param::Lookahead)?;
    let v_gain = ctx.params.get(Param::Vgain)?;
    let v_cong = ctx.params.get(Param::Vcong)?;

    let current = ctx.anticipated_speed(RelativeLane::Current, lookahead);
    let gain = |lane: RelativeLane| {
        if !ctx.snapshot.lane_exists(lane) {
            return 0.0;
        }
        let delta = ctx.anticipated_speed(lane, lookahead) - current;
        (delta / v_gain).clamp(-1.0, 1.0)
    };

    let left = gain(RelativeLane::Left);
    let mut right = gain(RelativeLane::Right);
    if right > 0.0 && ctx.snapshot.speed() > v_cong {
        right = 0.0;
    }
    Ok(Desire::new(left, right))
}
