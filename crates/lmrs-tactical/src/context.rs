//! Injectable per-call context.

use std::ops::AddAssign;

/// Event counts accumulated while planning.  Owned by the caller and passed
/// through [`PlanContext`]; nothing is counted globally.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerCounters {
    pub plans:               u64,
    pub lane_changes:        u64,
    pub synchronizations:    u64,
    pub yields:              u64,
    pub fallbacks:           u64,
    pub structural_failures: u64,
}

impl PlannerCounters {
    pub fn merge(&mut self, other: &PlannerCounters) {
        self.plans               += other.plans;
        self.lane_changes        += other.lane_changes;
        self.synchronizations    += other.synchronizations;
        self.yields              += other.yields;
        self.fallbacks           += other.fallbacks;
        self.structural_failures += other.structural_failures;
    }
}

impl AddAssign<&PlannerCounters> for PlannerCounters {
    fn add_assign(&mut self, other: &PlannerCounters) {
        self.merge(other);
    }
}

/// Mutable state threaded through [`TacticalPlanner::request_plan`].
///
/// [`TacticalPlanner::request_plan`]: crate::TacticalPlanner::request_plan
#[derive(Clone, Debug, Default)]
pub struct PlanContext {
    pub counters: PlannerCounters,
}

impl PlanContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn counters(&self) -> &PlannerCounters {
        &self.counters
    }
}
