//! Keep-right bias in free traffic.

use lmrs_core::{Param, ParameterResult, RelativeLane};

use crate::{Desire, IncentiveContext};

/// Constant `DFREE` toward an existing right lane, unless the route
/// discourages going right.
pub(super) fn desire(ctx: &IncentiveContext<'_>, mandatory: Desire) -> ParameterResult<Desire> {
    if mandatory.right() < 0.0 || !ctx.snapshot.lane_exists(RelativeLane::Right) {
        return Ok(Desire::ZERO);
    }
    Ok(Desire::new(0.0, ctx.params.get(Param::Dfree)?))
}
