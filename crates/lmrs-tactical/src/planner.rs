//! The per-GTU tactical planner.

use lmrs_behavior::{CarFollowingModel, DesireSynthesizer, Following, IdmPlus, IncentiveContext, TaskDemand};
use lmrs_conflict::{ConflictContext, ConflictEngine, ConflictPlans};
use lmrs_core::{
    GtuId, IndicatorIntent, LanePosition, LateralDirection, Param, ParameterSet, RelativeLane, SimTime,
    TimeWindow, TurnIndicator,
};
use lmrs_perception::{PerceptionError, PerceptionSource, Snapshot, SnapshotBuilder};
use tracing::{debug, warn};

use crate::lane_change::{accept_gap, cooperate, synchronize, GapDecision};
use crate::{
    LaneChangeIntent, OperationalPlan, PlanContext, PlanKind, PlannerConfig, TacticalError, TacticalResult,
};

// ── PlanRequest ───────────────────────────────────────────────────────────────

/// One scheduler call: plan `gtu` from `start_time` at `start_location`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PlanRequest {
    pub gtu:            GtuId,
    pub start_time:     SimTime,
    pub start_location: LanePosition,
    /// Validity of the returned plan, seconds.  Non-positive or non-finite
    /// values fall back to the planner's configured interval.
    pub interval:       f64,
}

impl PlanRequest {
    pub fn new(gtu: GtuId, start_time: SimTime, start_location: LanePosition, interval: f64) -> Self {
        Self { gtu, start_time, start_location, interval }
    }
}

// ── TacticalPlanner ───────────────────────────────────────────────────────────

/// Owns everything one GTU's driver carries across epochs: its parameters,
/// its incentive set, and its conflict plans.
///
/// Per epoch, [`request_plan`][Self::request_plan]:
///
/// 1. pulls and validates a perception snapshot;
/// 2. estimates headway and distraction task demand;
/// 3. evaluates the incentives and
/// 4. synthesizes desire, then completes the lane-changing demand;
/// 5. computes car-following acceleration;
/// 6. bounds it by the conflict engine;
/// 7. starts a lane change when desire beats the load-scaled threshold and
///    the gap is accepted, else synchronizes or stays in lane.
#[derive(Clone, Debug)]
pub struct TacticalPlanner<C: CarFollowingModel = IdmPlus> {
    gtu:         GtuId,
    params:      ParameterSet,
    model:       C,
    synthesizer: DesireSynthesizer,
    config:      PlannerConfig,
    conflicts:   ConflictPlans,
}

impl TacticalPlanner<IdmPlus> {
    pub fn new(gtu: GtuId, params: ParameterSet) -> TacticalResult<Self> {
        Self::with_model(gtu, params, IdmPlus)
    }
}

impl<C: CarFollowingModel> TacticalPlanner<C> {
    /// Validates `params` once; planning never rechecks bounds.
    pub fn with_model(gtu: GtuId, params: ParameterSet, model: C) -> TacticalResult<Self> {
        params.validate()?;
        Ok(Self {
            gtu,
            params,
            model,
            synthesizer: DesireSynthesizer::default(),
            config:      PlannerConfig::default(),
            conflicts:   ConflictPlans::new(gtu),
        })
    }

    pub fn with_synthesizer(mut self, synthesizer: DesireSynthesizer) -> Self {
        self.synthesizer = synthesizer.with_mandatory_dominance(self.config.mandatory_dominance);
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.synthesizer = self.synthesizer.with_mandatory_dominance(config.mandatory_dominance);
        self.config = config;
        self
    }

    #[inline]
    pub fn gtu(&self) -> GtuId {
        self.gtu
    }

    #[inline]
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[inline]
    pub fn conflicts(&self) -> &ConflictPlans {
        &self.conflicts
    }

    /// `true` while a conflict plan forces a Yield or the GTU stands still
    /// inside a conflict.
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.conflicts.is_blocking()
    }

    /// Request at `start_time` with the configured replanning interval.
    pub fn request(&self, start_time: SimTime, start_location: LanePosition) -> PlanRequest {
        PlanRequest::new(self.gtu, start_time, start_location, self.config.replanning_interval)
    }

    /// Forget all conflict memory, e.g. after the GTU was teleported.
    pub fn reset(&mut self) {
        self.conflicts.clear();
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// Plan one epoch.  Never blocks and never retries.
    ///
    /// Incomplete perception yields a maximum-deceleration fallback plan.
    /// A GTU that is no longer on the network yields
    /// [`TacticalError::NotOnNetwork`]; the caller should remove it.
    pub fn request_plan(
        &mut self,
        request:    PlanRequest,
        perception: &dyn PerceptionSource,
        ctx:        &mut PlanContext,
    ) -> TacticalResult<OperationalPlan> {
        if request.gtu != self.gtu {
            return Err(TacticalError::WrongGtu { owner: self.gtu, requested: request.gtu });
        }
        let interval = if request.interval > 0.0 && request.interval.is_finite() {
            request.interval
        } else {
            self.config.replanning_interval
        };
        let window = TimeWindow::new(request.start_time, interval);

        let builder = match perception.perceive(self.gtu, request.start_time, request.start_location) {
            Ok(builder) => builder,
            Err(e) => return self.perception_failure(e, None, window, request.start_location, ctx),
        };
        self.plan_builder(builder, window, request.start_location, ctx)
    }

    /// Plan from an already built snapshot.
    pub fn plan_snapshot(
        &mut self,
        snapshot:       &Snapshot,
        window:         TimeWindow,
        start_location: LanePosition,
        ctx:            &mut PlanContext,
    ) -> TacticalResult<OperationalPlan> {
        let plan = self.plan(snapshot, window, start_location, ctx)?;
        ctx.counters.plans += 1;
        Ok(plan)
    }

    /// Validate `builder` and plan from it.
    pub fn plan_builder(
        &mut self,
        builder:        SnapshotBuilder,
        window:         TimeWindow,
        start_location: LanePosition,
        ctx:            &mut PlanContext,
    ) -> TacticalResult<OperationalPlan> {
        let speed = builder.ego_speed();
        match builder.build() {
            Ok(snapshot) => self.plan_snapshot(&snapshot, window, start_location, ctx),
            Err(e) => self.perception_failure(e, speed, window, start_location, ctx),
        }
    }

    fn plan(
        &mut self,
        snap:           &Snapshot,
        window:         TimeWindow,
        start_location: LanePosition,
        ctx:            &mut PlanContext,
    ) -> TacticalResult<OperationalPlan> {
        let Self { gtu, params, model, synthesizer, conflicts, config, .. } = self;
        let gtu = *gtu;
        let p: &ParameterSet = params;
        let v = snap.speed();

        // ① desired speed & task demand (headway, distraction)
        let v0 = model.desired_speed(p, snap.current_infrastructure().speed_limit)?;
        let demand = TaskDemand::estimate(snap, p)?;

        // ②③ incentives & synthesis
        let synthesis = synthesizer.synthesize(&IncentiveContext::new(snap, p, v0));
        let desire = synthesis.desire;
        let demand = demand.with_lane_changing(&desire);

        // ④ car-following
        let following = Following::new(p, v, v0)?;
        let mut a = model.follow_leaders(p, following, snap.leaders(RelativeLane::Current))?;

        // ⑤ conflicts
        let cctx = ConflictContext::new(snap, p, &*model, v0).deferring_distant(config.defer_distant_conflicts);
        let outcome = ConflictEngine.approach(&cctx, conflicts, desire)?;
        a = a.min(outcome.acceleration);
        if outcome.yielding.is_some() {
            ctx.counters.yields += 1;
        }

        // ⑥ lateral
        let mut indicator = outcome.indicator;
        let mut lane_change = None;
        let (lat, d) = desire.dominant();
        let in_progress = snap.lane_change_in_progress();

        if !in_progress.is_none() {
            indicator = TurnIndicator::new(IndicatorIntent::from(in_progress), 0.0);
        } else {
            if !lat.is_none() && d >= lane_change_threshold(p, &demand)? {
                match accept_gap(&cctx, lat, d)? {
                    GapDecision::Accepted { acceleration } => {
                        a = a.min(acceleration);
                        lane_change = Some(LaneChangeIntent { direction: lat, duration: p.get(Param::LcDur)? });
                        indicator = TurnIndicator::new(IndicatorIntent::from(lat), 0.0);
                        ctx.counters.lane_changes += 1;
                        debug!(%gtu, direction = %lat, desire = d, "lane change started");
                    }
                    GapDecision::Rejected(reason) => {
                        debug!(%gtu, direction = %lat, desire = d, %reason, "gap rejected");
                    }
                }
            }
            if lane_change.is_none() {
                if let Some(sync) = synchronization(&cctx, lat, d)? {
                    a = a.min(sync.acceleration);
                    if let Some(i) = sync.indicator {
                        indicator = i;
                    }
                    ctx.counters.synchronizations += 1;
                }
                a = a.min(cooperate(&cctx)?);
            }
        }

        a = a.max(-p.get(Param::Bmax)?);

        let mut plan = OperationalPlan::longitudinal(gtu, window, start_location, v, a);
        plan.lane_change = lane_change;
        plan.indicator = indicator;
        plan.blocking = outcome.blocking;
        plan.desire = desire;
        plan.task_demand = demand;
        Ok(plan)
    }

    fn perception_failure(
        &self,
        error:          PerceptionError,
        speed:          Option<f64>,
        window:         TimeWindow,
        start_location: LanePosition,
        ctx:            &mut PlanContext,
    ) -> TacticalResult<OperationalPlan> {
        match error {
            PerceptionError::NotOnNetwork(gtu) => {
                ctx.counters.structural_failures += 1;
                warn!(%gtu, "GTU not on the network; no plan");
                Err(TacticalError::NotOnNetwork(gtu))
            }
            PerceptionError::MissingCategory { gtu, category } => {
                ctx.counters.fallbacks += 1;
                ctx.counters.plans += 1;
                warn!(%gtu, %category, "incomplete perception; braking at BMAX");
                let b_max = self.params.get(Param::Bmax)?;
                let plan = OperationalPlan::longitudinal(gtu, window, start_location, speed.unwrap_or(0.0), -b_max)
                    .with_kind(PlanKind::Fallback);
                Ok(plan)
            }
        }
    }
}

// ── Lateral helpers ───────────────────────────────────────────────────────────

struct Synchronization {
    acceleration: f64,
    indicator:    Option<TurnIndicator>,
}

/// Prepare a lane change toward `lat` that is not (yet) possible: adapt to
/// the target lane from `DSYNC`, indicate from `DCOOP`.
fn synchronization(ctx: &ConflictContext<'_>, lat: LateralDirection, desire: f64) -> TacticalResult<Option<Synchronization>> {
    let p = ctx.params;
    if lat.is_none() || !ctx.snapshot.lane_exists(RelativeLane::from(lat)) || desire < p.get(Param::Dsync)? {
        return Ok(None);
    }
    let indicator = (desire >= p.get(Param::Dcoop)?).then(|| TurnIndicator::new(IndicatorIntent::from(lat), 0.0));
    Ok(Some(Synchronization { acceleration: synchronize(ctx, lat, desire)?, indicator }))
}

/// Desire needed to start a lane change: `DFREE`, raised toward 1 as the
/// task load grows.
pub fn lane_change_threshold(params: &ParameterSet, demand: &TaskDemand) -> TacticalResult<f64> {
    let d_free = params.get(Param::Dfree)?;
    let suppression = params.get(Param::TdSuppression)?;
    Ok((d_free + (1.0 - d_free) * suppression * demand.load()).min(1.0))
}
