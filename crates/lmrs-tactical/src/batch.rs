//! Planning many GTUs for one epoch.
//!
//! Every planner reads only its own snapshot (epoch-start state of its
//! neighbors) and writes only its own conflict plans, so the batch is
//! embarrassingly parallel.  With the `parallel` feature it runs on Rayon's
//! thread pool; counters are gathered per GTU and merged afterwards, and
//! results are returned in ascending `GtuId` order either way.

use lmrs_behavior::CarFollowingModel;
use lmrs_core::GtuId;
use lmrs_perception::PerceptionSource;

use crate::{OperationalPlan, PlanContext, PlanRequest, TacticalError, TacticalPlanner, TacticalResult};

/// One GTU's outcome in a batch.
pub type BatchResult = (GtuId, TacticalResult<OperationalPlan>);

/// Plan `planners[i]` for `requests[i]`.
///
/// Per-GTU failures (e.g. a GTU that left the network) are reported in the
/// returned list and do not stop the batch.
pub fn plan_all<C: CarFollowingModel>(
    planners:   &mut [TacticalPlanner<C>],
    requests:   &[PlanRequest],
    perception: &dyn PerceptionSource,
    ctx:        &mut PlanContext,
) -> TacticalResult<Vec<BatchResult>> {
    if requests.len() != planners.len() {
        return Err(TacticalError::CountMismatch {
            expected: planners.len(),
            got:      requests.len(),
            what:     "requests",
        });
    }

    #[cfg(not(feature = "parallel"))]
    let mut results: Vec<BatchResult> = planners
        .iter_mut()
        .zip(requests)
        .map(|(planner, &request)| (planner.gtu(), planner.request_plan(request, perception, ctx)))
        .collect();

    #[cfg(feature = "parallel")]
    let mut results: Vec<BatchResult> = {
        use rayon::prelude::*;

        let planned: Vec<(GtuId, TacticalResult<OperationalPlan>, PlanContext)> = planners
            .par_iter_mut()
            .zip(requests.par_iter())
            .map(|(planner, &request)| {
                let mut local = PlanContext::new();
                let result = planner.request_plan(request, perception, &mut local);
                (planner.gtu(), result, local)
            })
            .collect();

        planned
            .into_iter()
            .map(|(gtu, result, local)| {
                ctx.counters.merge(&local.counters);
                (gtu, result)
            })
            .collect()
    };

    results.sort_by_key(|(gtu, _)| *gtu);
    Ok(results)
}
