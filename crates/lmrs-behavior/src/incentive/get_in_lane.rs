//! Getting into a congested target lane early, and staying out of queues
//! that have to merge back.

use lmrs_core::{LateralDirection, Param, ParameterResult, RelativeLane};

use crate::{Desire, IncentiveContext};

/// Per side, with congestion `c = 1 − vAnt/VCONG` on the adjacent lane:
///
/// - route wants that side and the lane is congested: `c · (1 − mandatory)`,
///   topping the mandatory desire up toward 1;
/// - the lane is a congested dead end: `−SOCIO · c`.
pub(super) fn desire(ctx: &IncentiveContext<'_>, mandatory: Desire) -> ParameterResult<Desire> {
    let lookahead = ctx.params.get(Param::Lookahead)?;
    let v_cong = ctx.params.get(Param::Vcong)?;
    let socio = ctx.params.get(Param::Socio)?;

    let side = |lat: LateralDirection| {
        let lane = RelativeLane::from(lat);
        let Some(record) = ctx.snapshot.infrastructure(lane) else {
            return 0.0;
        };
        let v_ant = ctx.anticipated_speed(lane, lookahead);
        // VCONG = 0 disables congestion altogether.
        if v_cong <= 0.0 || v_ant >= v_cong {
            return 0.0;
        }
        let congestion = (1.0 - v_ant / v_cong).clamp(0.0, 1.0);
        let m = mandatory.get(lat);
        if m > 0.0 {
            congestion * (1.0 - m)
        } else if record.dead_end {
            -socio * congestion
        } else {
            0.0
        }
    };

    Ok(Desire::new(side(LateralDirection::Left), side(LateralDirection::Right)))
}
