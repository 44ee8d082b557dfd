//! One GTU's arena of conflict plans.

#[cfg(not(feature = "fx-hash"))]
use std::collections::HashMap;

#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashMap as HashMap;

use lmrs_core::{ConflictId, GtuId, IndicatorIntent, SimTime, TurnIndicator};
use lmrs_perception::{ConflictRule, PerceivedConflict};
use tracing::trace;

use crate::ConflictPlan;

/// All conflict plans of a single GTU, keyed by conflict id.
///
/// Owned by the GTU's tactical planner, so planners for different GTUs never
/// share plan state and can run in parallel without locking.
///
/// Besides the plans, the arena remembers when conflicting GTUs arrived at
/// all-stop conflicts and which GTU the ego lets in first at a zip merge.
#[derive(Clone, Debug, Default)]
pub struct ConflictPlans {
    gtu:       GtuId,
    plans:     HashMap<ConflictId, ConflictPlan>,
    arrivals:  HashMap<GtuId, SimTime>,
    zip:       Option<GtuId>,
    indicator: TurnIndicator,
}

impl ConflictPlans {
    pub fn new(gtu: GtuId) -> Self {
        Self {
            gtu,
            plans: HashMap::default(),
            arrivals: HashMap::default(),
            zip: None,
            indicator: TurnIndicator::OFF,
        }
    }

    #[inline]
    pub fn gtu(&self) -> GtuId {
        self.gtu
    }

    #[inline]
    pub fn get(&self, conflict: ConflictId) -> Option<&ConflictPlan> {
        self.plans.get(&conflict)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConflictPlan> + '_ {
        self.plans.values()
    }

    /// `true` while any committed plan forces a Yield, or while the GTU
    /// stands still inside a conflict.
    pub fn is_blocking(&self) -> bool {
        self.plans.values().any(|p| p.blocking || p.forces_yield())
    }

    /// The conflicting GTU the ego lets merge in first, if any.
    #[inline]
    pub fn zip_gtu(&self) -> Option<GtuId> {
        self.zip
    }

    /// When a conflicting GTU was first seen waiting at an all-stop conflict.
    #[inline]
    pub fn arrival(&self, gtu: GtuId) -> Option<SimTime> {
        self.arrivals.get(&gtu).copied()
    }

    /// Indicator requested by the closest conflict this epoch.
    #[inline]
    pub fn indicator(&self) -> TurnIndicator {
        self.indicator
    }

    /// Request an indicator; the closest request of the epoch wins.
    pub fn set_indicator_intent(&mut self, intent: IndicatorIntent, distance: f64) {
        self.indicator.merge(TurnIndicator::new(intent, distance));
    }

    /// Forget everything, e.g. when the GTU is removed from the network.
    pub fn clear(&mut self) {
        self.plans.clear();
        self.arrivals.clear();
        self.zip = None;
        self.indicator = TurnIndicator::OFF;
    }

    /// Reset per-epoch outputs before a new evaluation.
    pub(crate) fn begin_epoch(&mut self) {
        self.indicator = TurnIndicator::OFF;
        for plan in self.plans.values_mut() {
            plan.blocking = false;
        }
    }

    /// Drop plans for conflicts no longer perceived.  Returns how many.
    pub(crate) fn retain_visible(&mut self, visible: &[PerceivedConflict]) -> usize {
        let before = self.plans.len();
        let gtu = self.gtu;
        self.plans.retain(|id, _| {
            let keep = visible.iter().any(|c| c.id == *id);
            if !keep {
                trace!(%gtu, conflict = %id, "conflict plan dropped");
            }
            keep
        });
        before - self.plans.len()
    }

    pub(crate) fn set_zip_gtu(&mut self, gtu: Option<GtuId>) {
        if self.zip != gtu {
            trace!(gtu = %self.gtu, zip = ?gtu, "zip merge partner");
        }
        self.zip = gtu;
    }

    /// Remember when conflicting GTUs came within `stop_area` of an
    /// all-stop conflict, and forget those no longer waiting there.
    pub(crate) fn record_arrivals(&mut self, visible: &[PerceivedConflict], stop_area: f64, now: SimTime) {
        let waiting = || {
            visible
                .iter()
                .filter(|c| c.rule == ConflictRule::AllStop)
                .flat_map(|c| c.upstream.iter())
                .filter(move |g| g.distance <= stop_area)
        };
        for g in waiting() {
            self.arrivals.entry(g.id).or_insert(now);
        }
        self.arrivals.retain(|id, _| waiting().any(|g| g.id == *id));
    }

    /// Earliest recorded arrival among GTUs waiting at `conflict`, with
    /// the GTU id as tie-breaker.
    pub(crate) fn first_arrival(&self, conflict: &PerceivedConflict, stop_area: f64) -> Option<(SimTime, GtuId)> {
        conflict
            .upstream
            .iter()
            .filter(|g| g.distance <= stop_area)
            .filter_map(|g| self.arrival(g.id).map(|t| (t, g.id)))
            .min_by(|a, b| a.0.secs().total_cmp(&b.0.secs()).then(a.1.cmp(&b.1)))
    }

    /// The plan for `conflict`, created on first sight and reset when the
    /// approach changed.
    pub(crate) fn observe(&mut self, conflict: &PerceivedConflict, now: SimTime) -> &mut ConflictPlan {
        let gtu = self.gtu;
        let plan = self
            .plans
            .entry(conflict.id)
            .or_insert_with(|| ConflictPlan::new(conflict, now));
        if !plan.matches(conflict) {
            trace!(%gtu, conflict = %conflict.id, "conflict geometry changed; plan reset");
            *plan = ConflictPlan::new(conflict, now);
        }
        plan.last_seen = now;
        plan
    }
}
