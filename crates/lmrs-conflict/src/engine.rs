//! Per-epoch conflict approach.

use lmrs_behavior::{CarFollowingModel, Desire, Following, LeaderState};
use lmrs_core::{ConflictId, GtuId, IndicatorIntent, LateralDirection, Param, ParameterSet, RelativeLane, SimTime, TurnIndicator};
use lmrs_perception::{ConflictKind, ConflictRule, PerceivedConflict, Snapshot};
use tracing::debug;

use crate::gap::{give_way_gap_accepted, priority_gap_available, time_to_cover, GiveWay};
use crate::{ConflictAction, ConflictPlans, ConflictResult, StopPhase};

/// Below this speed a GTU counts as standing still, m/s.
const STANDSTILL: f64 = 0.1;

// ── Context & outcome ─────────────────────────────────────────────────────────

/// Read-only inputs for one GTU's conflict evaluation.
#[derive(Copy, Clone)]
pub struct ConflictContext<'a> {
    pub snapshot:      &'a Snapshot,
    pub params:        &'a ParameterSet,
    pub model:         &'a dyn CarFollowingModel,
    pub desired_speed: f64,
    /// Skip the evaluation while the nearest conflict lies beyond the
    /// comfortable stopping distance.
    pub defer_distant: bool,
}

impl<'a> ConflictContext<'a> {
    pub fn new(
        snapshot:      &'a Snapshot,
        params:        &'a ParameterSet,
        model:         &'a dyn CarFollowingModel,
        desired_speed: f64,
    ) -> Self {
        Self { snapshot, params, model, desired_speed, defer_distant: false }
    }

    pub fn deferring_distant(mut self, defer: bool) -> Self {
        self.defer_distant = defer;
        self
    }
}

/// Result of [`ConflictEngine::approach`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ConflictOutcome {
    /// Acceleration bound from conflicts; `f64::INFINITY` when unconstrained.
    pub acceleration: f64,
    pub blocking:     bool,
    pub indicator:    TurnIndicator,
    /// The conflict the GTU is yielding to, if any.
    pub yielding:     Option<ConflictId>,
}

impl Default for ConflictOutcome {
    fn default() -> Self {
        Self {
            acceleration: f64::INFINITY,
            blocking:     false,
            indicator:    TurnIndicator::OFF,
            yielding:     None,
        }
    }
}

// ── ConflictEngine ────────────────────────────────────────────────────────────

/// Stateless conflict logic; all memory lives in the GTU's [`ConflictPlans`].
#[derive(Copy, Clone, Debug, Default)]
pub struct ConflictEngine;

impl ConflictEngine {
    /// Evaluate every conflict on the current lane, update the GTU's plans,
    /// and bound the acceleration.  Adjacent-lane conflicts add a capped
    /// deceleration toward lanes the GTU intends to enter (`desire ≥ DSYNC`).
    pub fn approach(
        &self,
        ctx:    &ConflictContext<'_>,
        plans:  &mut ConflictPlans,
        desire: Desire,
    ) -> ConflictResult<ConflictOutcome> {
        let snap = ctx.snapshot;
        let p = ctx.params;
        let t_ind = p.get(Param::TInd)?;
        let v = snap.speed();

        plans.begin_epoch();
        plans.retain_visible(snap.conflicts());
        plans.record_arrivals(snap.conflicts(), p.get(Param::StopArea)?, snap.time());

        let current: Vec<&PerceivedConflict> = snap.conflicts_on(RelativeLane::Current).collect();
        let mut outcome = ConflictOutcome::default();

        for conflict in &current {
            if conflict.turn != IndicatorIntent::None
                && conflict.end_distance() > 0.0
                && conflict.distance <= v * t_ind
            {
                plans.set_indicator_intent(conflict.turn, conflict.distance.max(0.0));
            }
        }

        let horizon = if ctx.defer_distant { self.stopping_distance(ctx)? } else { f64::INFINITY };
        if current.first().is_some_and(|c| c.distance > horizon) {
            debug!(gtu = %snap.gtu(), horizon, "conflicts beyond stopping distance; deferred");
        } else {
            self.resolve(ctx, plans, &current, &mut outcome)?;
        }

        outcome.acceleration = outcome.acceleration.min(self.adjacent_acceleration(ctx, desire)?);
        outcome.blocking = plans.is_blocking();
        outcome.indicator = plans.indicator();
        Ok(outcome)
    }

    /// Decide the current-lane conflicts in order, up to the first Yield.
    fn resolve(
        &self,
        ctx:     &ConflictContext<'_>,
        plans:   &mut ConflictPlans,
        current: &[&PerceivedConflict],
        outcome: &mut ConflictOutcome,
    ) -> ConflictResult<()> {
        let snap = ctx.snapshot;
        let bcrit = ctx.params.get(Param::Bcrit)?;
        let passable = ctx.params.get(Param::S0Conf)? + snap.ego().length;
        let v = snap.speed();
        let now = snap.time();
        // Crossings ahead with conflicting traffic; the ego must not stop on them.
        let mut keep_clear: Vec<&PerceivedConflict> = Vec::new();

        for conflict in current {
            outcome.acceleration = outcome.acceleration.min(self.follow_occupants(ctx, conflict)?);

            if !conflict.is_ahead() {
                let plan = plans.observe(conflict, now);
                plan.passed = true;
                plan.blocking = v < STANDSTILL && conflict.end_distance() + snap.ego().length > 0.0;
                continue;
            }

            if conflict.kind == ConflictKind::Split {
                plans.observe(conflict, now).commit(ConflictAction::Go, false);
                continue;
            }

            if self.decide(ctx, plans, conflict)? == ConflictAction::Yield {
                let stop_at = keep_clear_distance(&keep_clear, conflict.distance, passable);
                let a_yield = self.stop_acceleration(ctx, stop_at)?.max(-bcrit);
                outcome.acceleration = outcome.acceleration.min(a_yield);
                outcome.yielding = Some(conflict.id);
                break;
            }

            if conflict.kind == ConflictKind::Crossing && !conflict.upstream.is_empty() {
                keep_clear.push(conflict);
            }
        }
        Ok(())
    }

    /// Commit Yield or Go for a conflict ahead and return the plan's action.
    fn decide(
        &self,
        ctx:      &ConflictContext<'_>,
        plans:    &mut ConflictPlans,
        conflict: &PerceivedConflict,
    ) -> ConflictResult<ConflictAction> {
        let snap = ctx.snapshot;
        let p = ctx.params;
        let bcrit = p.get(Param::Bcrit)?;
        let stop_area = p.get(Param::StopArea)?;
        let passable = p.get(Param::S0Conf)? + snap.ego().length;
        let v = snap.speed();
        let now = snap.time();

        let a_stop = self.stop_acceleration(ctx, conflict.distance)?;
        let (gap_ok, courtesy, zip) = if conflict.is_priority() {
            let courtesy = courtesy_yield(snap, conflict, passable);
            let zip = conflict.kind == ConflictKind::Merge && zip_merge(plans, conflict, courtesy, stop_area);
            (priority_gap_available(conflict, p.get(Param::ConflictGap)?), courtesy, zip)
        } else {
            (give_way_gap_accepted(conflict, self.give_way(ctx, conflict)?), false, false)
        };
        let first_waiting = plans.first_arrival(conflict, stop_area);
        let own = plans.gtu();

        let plan = plans.observe(conflict, now);
        if conflict.rule.requires_stop() && conflict.distance <= stop_area {
            if plan.arrival.is_none() {
                plan.arrival = Some(now);
            }
            if plan.stop_phase == StopPhase::Approach && v < STANDSTILL {
                plan.stop_phase = StopPhase::Stopped;
            }
        }
        let go = match conflict.rule {
            ConflictRule::Priority => gap_ok && !courtesy && !zip,
            ConflictRule::GiveWay  => gap_ok,
            ConflictRule::Stop     => plan.stop_phase != StopPhase::Approach && gap_ok,
            ConflictRule::AllStop  => {
                plan.stop_phase != StopPhase::Approach
                    && first_in_line(own, plan.arrival, first_waiting)
                    && conflict.occupants().next().is_none()
            }
        };

        let action = if plan.is_sticky_go() || go {
            ConflictAction::Go
        } else if plan.action != ConflictAction::Yield && a_stop < -bcrit {
            // Too late to stop comfortably.
            ConflictAction::Go
        } else {
            ConflictAction::Yield
        };
        if action == ConflictAction::Go && plan.stop_phase == StopPhase::Stopped {
            plan.stop_phase = StopPhase::Run;
        }
        let hold = conflict.is_priority() || plan.stop_phase == StopPhase::Run;
        if plan.commit(action, hold) {
            debug!(gtu = %snap.gtu(), conflict = %conflict.id, %action, distance = conflict.distance, "conflict decision");
        }
        Ok(plan.action)
    }

    /// Distance needed to stop comfortably at `B`, plus `S0` and the ego length.
    pub fn stopping_distance(&self, ctx: &ConflictContext<'_>) -> ConflictResult<f64> {
        let p = ctx.params;
        let v = ctx.snapshot.speed();
        Ok(p.get(Param::S0)? + ctx.snapshot.ego().length + v * v / (2.0 * p.get(Param::B)?))
    }

    /// Stateless acceleration bound from conflicts on `lane`, as if the GTU
    /// were already there.  Used to vet lane changes.
    pub fn lane_acceleration(&self, ctx: &ConflictContext<'_>, lane: RelativeLane) -> ConflictResult<f64> {
        let gap = ctx.params.get(Param::ConflictGap)?;
        let mut a = f64::INFINITY;
        for conflict in ctx.snapshot.conflicts_on(lane) {
            a = a.min(self.follow_occupants(ctx, conflict)?);
            if !conflict.is_ahead() || conflict.kind == ConflictKind::Split {
                continue;
            }
            let go = match conflict.rule {
                ConflictRule::Priority => priority_gap_available(conflict, gap),
                ConflictRule::GiveWay => give_way_gap_accepted(conflict, self.give_way(ctx, conflict)?),
                // A stop line always brings the GTU to a halt first.
                ConflictRule::Stop | ConflictRule::AllStop => false,
            };
            if !go {
                a = a.min(self.stop_acceleration(ctx, conflict.distance)?);
            }
        }
        Ok(a)
    }

    /// Deceleration toward an adjacent lane's conflicts the GTU intends to
    /// reach, only where the conflict lies beyond the legal lane change
    /// range and never harder than `B`.
    fn adjacent_acceleration(&self, ctx: &ConflictContext<'_>, desire: Desire) -> ConflictResult<f64> {
        let p = ctx.params;
        let d_sync = p.get(Param::Dsync)?;
        let b = p.get(Param::B)?;
        let mut a = f64::INFINITY;
        for lat in [LateralDirection::Left, LateralDirection::Right] {
            let lane = RelativeLane::from(lat);
            let Some(record) = ctx.snapshot.infrastructure(lane) else {
                continue;
            };
            if desire.get(lat) < d_sync {
                continue;
            }
            for conflict in ctx.snapshot.conflicts_on(lane) {
                if conflict.distance <= record.legal_change
                    || conflict.is_priority()
                    || conflict.kind == ConflictKind::Split
                {
                    continue;
                }
                if conflict.rule.requires_stop() || !give_way_gap_accepted(conflict, self.give_way(ctx, conflict)?) {
                    a = a.min(self.stop_acceleration(ctx, conflict.distance)?.max(-b));
                }
            }
        }
        Ok(a)
    }

    /// Stop at `distance`: the stronger of car-following toward a stationary
    /// leader at `S0_CONF` and the constant deceleration that ends exactly
    /// there.
    pub fn stop_acceleration(&self, ctx: &ConflictContext<'_>, distance: f64) -> ConflictResult<f64> {
        let p = ctx.params;
        let v = ctx.snapshot.speed();
        let following = Following::new(p, v, ctx.desired_speed)?
            .with_stopping_distance(p.get(Param::S0Conf)?);
        let a_cf = ctx.model.stop(p, following, distance)?;
        let a_kin = if v <= 0.0 {
            0.0
        } else if distance > 0.0 {
            -v * v / (2.0 * distance)
        } else {
            -p.get(Param::Bmax)?
        };
        Ok(a_cf.min(a_kin))
    }

    /// Follow conflicting GTUs that occupy a merge or split ahead, and stop
    /// for an occupied crossing.
    fn follow_occupants(&self, ctx: &ConflictContext<'_>, conflict: &PerceivedConflict) -> ConflictResult<f64> {
        let p = ctx.params;
        let v = ctx.snapshot.speed();
        match conflict.kind {
            ConflictKind::Merge | ConflictKind::Split => {
                let Some(leader) = conflict.downstream.first() else {
                    return Ok(f64::INFINITY);
                };
                let following = Following::new(p, v, ctx.desired_speed)?;
                let gap = conflict.distance + leader.distance;
                Ok(ctx.model.acceleration(p, following, Some(LeaderState::new(gap, leader.speed)))?)
            }
            ConflictKind::Crossing => {
                if conflict.is_ahead() && conflict.occupants().next().is_some() {
                    self.stop_acceleration(ctx, conflict.distance)
                } else {
                    Ok(f64::INFINITY)
                }
            }
        }
    }

    fn give_way(&self, ctx: &ConflictContext<'_>, conflict: &PerceivedConflict) -> ConflictResult<GiveWay> {
        let p = ctx.params;
        let ego = ctx.snapshot.ego();
        let clear_time = time_to_cover(
            conflict.end_distance() + ego.length,
            ego.speed,
            p.get(Param::A)?,
            ctx.desired_speed,
        );
        Ok(GiveWay {
            clear_time,
            time_factor:       p.get(Param::TimeFactor)?,
            gap:               p.get(Param::ConflictGap)?,
            stopping_distance: p.get(Param::S0)?,
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// On a priority approach, yield anyway when a standing leader beyond the
/// conflict leaves no room to clear it.
fn courtesy_yield(snap: &Snapshot, conflict: &PerceivedConflict, passable: f64) -> bool {
    snap.neighbors(RelativeLane::Current)
        .first_leader()
        .is_some_and(|l| {
            l.speed < STANDSTILL && l.distance >= conflict.distance && l.distance - conflict.end_distance() < passable
        })
}

/// At a priority merge, keep letting in the conflicting GTU the ego once
/// stopped for.  The partner is remembered when the ego yields out of
/// courtesy with that GTU within `stop_area`, and forgotten once it is no
/// longer first in line.
fn zip_merge(plans: &mut ConflictPlans, conflict: &PerceivedConflict, courtesy: bool, stop_area: f64) -> bool {
    let first = conflict.upstream.first();
    if plans.zip_gtu().is_some_and(|zip| first.is_some_and(|g| g.id == zip)) {
        return true;
    }
    let partner = first.filter(|g| courtesy && g.distance < stop_area).map(|g| g.id);
    plans.set_zip_gtu(partner);
    false
}

/// At an all-stop conflict, the ego goes when no GTU waiting there arrived
/// before it.  Equal arrivals go by GTU id.
fn first_in_line(own: GtuId, arrival: Option<SimTime>, first_waiting: Option<(SimTime, GtuId)>) -> bool {
    match (arrival, first_waiting) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(t), Some((other, id))) => t.secs() < other.secs() || (t == other && own < id),
    }
}

/// Where to stop when yielding at a conflict `distance` ahead: move the stop
/// upstream past earlier crossings whose downstream space cannot hold the
/// vehicle.  `upstream` holds only crossings with conflicting traffic.
fn keep_clear_distance(upstream: &[&PerceivedConflict], distance: f64, passable: f64) -> f64 {
    let mut stop_at = distance;
    for prev in upstream.iter().rev() {
        if stop_at - prev.end_distance() >= passable {
            break;
        }
        stop_at = prev.distance;
    }
    stop_at
}
