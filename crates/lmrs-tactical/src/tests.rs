//! Integration tests for lmrs-tactical.

use std::collections::HashMap;
use std::io::Write;

use lmrs_behavior::{CarFollowingModel, Desire, Following, IdmPlus, LeaderState, TaskDemand};
use lmrs_conflict::ConflictAction;
use lmrs_core::{
    ConflictId, GtuId, IndicatorIntent, LaneId, LanePosition, LateralDirection, Param, ParameterError,
    ParameterSet, RelativeLane, SimTime, TimeWindow,
};
use lmrs_perception::{
    ConflictKind, EgoKinematics, InfrastructureRecord, LaneNeighbors, PerceivedConflict, PerceivedGtu,
    PerceptionError, PerceptionResult, PerceptionSource, SnapshotBuilder,
};

use crate::lane_change::desire_headway;
use crate::operational::profile;
use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

const LIMIT: f64 = 30.0;

/// Perception that hands out prepared builders; unknown GTUs are off the
/// network.
#[derive(Default)]
struct World {
    builders: HashMap<GtuId, SnapshotBuilder>,
}

impl World {
    fn with(mut self, builder: SnapshotBuilder) -> Self {
        self.builders.insert(builder.gtu(), builder);
        self
    }
}

impl PerceptionSource for World {
    fn perceive(&self, gtu: GtuId, _time: SimTime, _location: LanePosition) -> PerceptionResult<SnapshotBuilder> {
        self.builders.get(&gtu).cloned().ok_or(PerceptionError::NotOnNetwork(gtu))
    }
}

fn road(gtu: u32, speed: f64) -> SnapshotBuilder {
    SnapshotBuilder::new(GtuId(gtu), SimTime(0.0))
        .ego(EgoKinematics::new(speed))
        .neighbors(RelativeLane::Current, LaneNeighbors::default())
        .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT))
}

fn at() -> LanePosition {
    LanePosition::new(LaneId(0), 0.0)
}

fn planner(gtu: u32) -> TacticalPlanner {
    TacticalPlanner::new(GtuId(gtu), ParameterSet::defaults()).unwrap()
}

fn plan_once(planner: &mut TacticalPlanner, world: &World) -> (TacticalResult<OperationalPlan>, PlannerCounters) {
    let mut ctx = PlanContext::new();
    let request = planner.request(SimTime(0.0), at());
    let result = planner.request_plan(request, world, &mut ctx);
    (result, ctx.counters)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── End-to-end scenarios ──────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn free_road_accelerates_toward_desired_speed() {
        let world = World::default().with(road(0, 20.0));
        let mut p = planner(0);
        let (plan, counters) = plan_once(&mut p, &world);
        let plan = plan.unwrap();

        let params = ParameterSet::defaults();
        let free = IdmPlus
            .acceleration(&params, Following::new(&params, 20.0, LIMIT).unwrap(), None)
            .unwrap();
        assert!(close(plan.acceleration(), free));
        assert!(plan.acceleration() > 0.0);
        assert!(plan.is_longitudinal_only());
        assert_eq!(plan.desire, Desire::ZERO);
        assert!(!plan.indicator.is_on());
        assert_eq!(plan.kind, PlanKind::Regular);
        assert_eq!(counters.plans, 1);
    }

    #[test]
    fn yields_at_non_priority_conflict() {
        let (v, d) = (10.0, 50.0);
        let conflict = PerceivedConflict::new(ConflictId(4), ConflictKind::Crossing, d, false)
            .with_upstream(PerceivedGtu::new(GtuId(99), 30.0, 15.0));
        let world = World::default().with(road(0, v).conflict(conflict));
        let mut p = planner(0);
        let (plan, counters) = plan_once(&mut p, &world);
        let plan = plan.unwrap();

        assert_eq!(p.conflicts().get(ConflictId(4)).unwrap().action, ConflictAction::Yield);
        assert!(close(v * v, 2.0 * plan.acceleration().abs() * d));
        assert!(plan.acceleration() >= -p.params().get(Param::Bcrit).unwrap());
        assert_eq!(counters.yields, 1);
    }

    #[test]
    fn route_desire_starts_lane_change() {
        let params = ParameterSet::defaults()
            .with(Param::T0, 1.5)
            .unwrap()
            .with(Param::Lookahead, 200.0)
            .unwrap();
        let mut p = TacticalPlanner::new(GtuId(0), params).unwrap();
        let builder = road(0, 20.0)
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT).with_route(100.0, 2))
            .infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT).with_route(100.0, 1));
        let world = World::default().with(builder);
        let (plan, counters) = plan_once(&mut p, &world);
        let plan = plan.unwrap();

        // max(1 − 100/400, 1 − 5/3) on the current lane, which the left
        // lane (0.5) improves on.
        assert!(close(plan.desire.left(), 0.75), "got {}", plan.desire.left());
        let lc = plan.lane_change.unwrap();
        assert_eq!(lc.direction, LateralDirection::Left);
        assert_eq!(lc.duration, 3.0);
        assert_eq!(plan.indicator.intent, IndicatorIntent::Left);
        assert_eq!(counters.lane_changes, 1);
    }

    #[test]
    fn rejected_gap_synchronizes_and_indicates() {
        let builder = road(0, 20.0)
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT).with_route(10.0, 1))
            .infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT))
            .leader(RelativeLane::Left, PerceivedGtu::new(GtuId(5), 5.0, 30.0))
            .follower(RelativeLane::Left, PerceivedGtu::new(GtuId(6), 2.0, 21.0));
        let world = World::default().with(builder);
        let mut p = planner(0);
        let (plan, counters) = plan_once(&mut p, &world);
        let plan = plan.unwrap();

        assert!(plan.desire.left() >= 0.8, "got {}", plan.desire.left());
        assert!(plan.lane_change.is_none());
        assert_eq!(plan.indicator.intent, IndicatorIntent::Left);
        assert_eq!(counters.synchronizations, 1);
        assert_eq!(counters.lane_changes, 0);
    }

    #[test]
    fn cooperates_with_indicating_adjacent_leader() {
        let leader = PerceivedGtu::new(GtuId(5), 20.0, 20.0).with_indicator(IndicatorIntent::Right);
        let builder = road(0, 20.0)
            .infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT))
            .leader(RelativeLane::Left, leader);
        let world = World::default().with(builder);
        let mut p = planner(0);
        let plan = plan_once(&mut p, &world).0.unwrap();

        let params = ParameterSet::defaults();
        let t = desire_headway(&params, params.get(Param::Dcoop).unwrap()).unwrap();
        let following = Following::new(&params, 20.0, LIMIT).unwrap().with_time_headway(t);
        let expected = IdmPlus
            .acceleration(&params, following, Some(LeaderState::new(20.0, 20.0)))
            .unwrap()
            .max(-params.get(Param::B).unwrap());
        assert!(close(plan.acceleration(), expected));
        assert!(plan.lane_change.is_none());
    }

    #[test]
    fn standing_inside_conflict_is_reported_blocking() {
        let conflict = PerceivedConflict::new(ConflictId(1), ConflictKind::Crossing, -1.0, false);
        let world = World::default().with(road(0, 0.0).conflict(conflict));
        let mut p = planner(0);
        let plan = plan_once(&mut p, &world).0.unwrap();
        assert!(plan.blocking);
        assert!(p.is_blocking());
    }

    #[test]
    fn yielding_at_give_way_crossing_is_reported_blocking() {
        let conflict = PerceivedConflict::new(ConflictId(1), ConflictKind::Crossing, 50.0, false)
            .with_upstream(PerceivedGtu::new(GtuId(9), 30.0, 15.0));
        let world = World::default().with(road(0, 10.0).conflict(conflict));
        let mut p = planner(0);
        let plan = plan_once(&mut p, &world).0.unwrap();
        assert_eq!(p.conflicts().get(ConflictId(1)).unwrap().action, ConflictAction::Yield);
        assert!(plan.blocking);
        assert!(p.is_blocking());
    }
}

// ── Failure handling ──────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use super::*;

    #[test]
    fn missing_category_gives_fallback_plan() {
        let incomplete = SnapshotBuilder::new(GtuId(0), SimTime(0.0))
            .ego(EgoKinematics::new(10.0))
            .neighbors(RelativeLane::Current, LaneNeighbors::default());
        let world = World::default().with(incomplete);
        let mut p = planner(0);
        let (plan, counters) = plan_once(&mut p, &world);
        let plan = plan.unwrap();
        assert!(plan.is_fallback());
        assert_eq!(plan.acceleration(), -8.0);
        assert_eq!(counters.fallbacks, 1);
        assert_eq!(counters.plans, 1);
    }

    #[test]
    fn fallback_without_ego_stands_still() {
        let world = World::default().with(SnapshotBuilder::new(GtuId(0), SimTime(0.0)));
        let mut p = planner(0);
        let plan = plan_once(&mut p, &world).0.unwrap();
        assert!(plan.is_fallback());
        assert_eq!(plan.end_speed(), 0.0);
        assert_eq!(plan.distance_at(0.5), 0.0);
    }

    #[test]
    fn off_network_is_structural() {
        let mut p = planner(0);
        let (result, counters) = plan_once(&mut p, &World::default());
        let err = result.unwrap_err();
        assert!(matches!(err, TacticalError::NotOnNetwork(GtuId(0))));
        assert!(err.is_structural());
        assert_eq!(counters.structural_failures, 1);
        assert_eq!(counters.plans, 0);
    }

    #[test]
    fn request_for_other_gtu_rejected() {
        let mut p = planner(0);
        let world = World::default().with(road(1, 10.0));
        let request = PlanRequest::new(GtuId(1), SimTime(0.0), at(), 0.5);
        let result = p.request_plan(request, &world, &mut PlanContext::new());
        assert!(matches!(result, Err(TacticalError::WrongGtu { .. })));
    }

    #[test]
    fn invalid_interval_uses_configured_one() {
        let mut p = planner(0);
        let world = World::default().with(road(0, 10.0));
        let request = PlanRequest::new(GtuId(0), SimTime(2.0), at(), f64::NAN);
        let plan = p.request_plan(request, &world, &mut PlanContext::new()).unwrap();
        assert_eq!(plan.window, TimeWindow::new(SimTime(2.0), 0.5));
    }
}

// ── Threshold & profile ───────────────────────────────────────────────────────

#[cfg(test)]
mod threshold {
    use super::*;

    #[test]
    fn load_raises_threshold() {
        let params = ParameterSet::defaults();
        let idle = TaskDemand::default();
        assert!(close(lane_change_threshold(&params, &idle).unwrap(), 0.365));

        let busy = TaskDemand { headway: 1.0, lane_changing: 1.0, distraction: 0.2 };
        assert!(close(lane_change_threshold(&params, &busy).unwrap(), 0.365 + 0.635 * 0.5));
    }

    #[test]
    fn desire_headway_interpolates() {
        let params = ParameterSet::defaults();
        assert!(close(desire_headway(&params, 0.0).unwrap(), 1.2));
        assert!(close(desire_headway(&params, 1.0).unwrap(), 0.56));
        assert!(close(desire_headway(&params, 2.0).unwrap(), 0.56));
        assert!(close(desire_headway(&params, 0.5).unwrap(), 0.88));
    }
}

#[cfg(test)]
mod gaps {
    use super::*;
    use lmrs_conflict::ConflictContext;

    use crate::lane_change::{accept_gap, synchronize, GapDecision, GapRejection};

    fn two_lane(speed: f64) -> SnapshotBuilder {
        road(0, speed).infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT))
    }

    #[test]
    fn synchronization_brakes_no_harder_than_critical() {
        // B above BCRIT: the defensive bound takes over.
        let params = ParameterSet::defaults().with(Param::B, 6.0).unwrap();
        let snap = two_lane(20.0)
            .leader(RelativeLane::Left, PerceivedGtu::new(GtuId(5), 2.0, 0.0))
            .build()
            .unwrap();
        let ctx = ConflictContext::new(&snap, &params, &IdmPlus, LIMIT);
        let a = synchronize(&ctx, LateralDirection::Left, 0.7).unwrap();
        assert_eq!(a, -params.get(Param::Bcrit).unwrap());
    }

    #[test]
    fn close_target_leader_rejects_gap() {
        let params = ParameterSet::defaults();
        let snap = two_lane(20.0)
            .leader(RelativeLane::Left, PerceivedGtu::new(GtuId(5), 2.0, 0.0))
            .build()
            .unwrap();
        let ctx = ConflictContext::new(&snap, &params, &IdmPlus, LIMIT);
        let decision = accept_gap(&ctx, LateralDirection::Left, 1.0).unwrap();
        assert_eq!(decision, GapDecision::Rejected(GapRejection::Leader));
    }

    #[test]
    fn open_gap_accepted_with_own_acceleration() {
        let params = ParameterSet::defaults();
        let snap = two_lane(20.0)
            .leader(RelativeLane::Left, PerceivedGtu::new(GtuId(5), 80.0, 20.0))
            .build()
            .unwrap();
        let ctx = ConflictContext::new(&snap, &params, &IdmPlus, LIMIT);
        let t = desire_headway(&params, 0.5).unwrap();
        let following = Following::new(&params, 20.0, LIMIT).unwrap().with_time_headway(t);
        let expected = IdmPlus
            .acceleration(&params, following, Some(LeaderState::new(80.0, 20.0)))
            .unwrap();
        match accept_gap(&ctx, LateralDirection::Left, 0.5).unwrap() {
            GapDecision::Accepted { acceleration } => assert!(close(acceleration, expected)),
            other => panic!("gap rejected: {other:?}"),
        }
    }
}

#[cfg(test)]
mod operational {
    use super::*;

    #[test]
    fn deceleration_splits_at_standstill() {
        let segments = profile(5.0, -2.0, 5.0);
        assert_eq!(segments.len(), 2);
        assert!(close(segments[0].duration, 2.5));
        assert_eq!(segments[1].acceleration, 0.0);

        let plan = OperationalPlan::longitudinal(GtuId(0), TimeWindow::new(SimTime(0.0), 5.0), at(), 5.0, -2.0);
        assert_eq!(plan.speed_at(4.0), 0.0);
        assert!(close(plan.distance_at(5.0), 6.25));
        assert_eq!(plan.acceleration_at(3.0), 0.0);
    }

    #[test]
    fn mild_deceleration_stays_single_segment() {
        assert_eq!(profile(10.0, -1.0, 2.0).len(), 1);
        let plan = OperationalPlan::longitudinal(GtuId(0), TimeWindow::new(SimTime(1.0), 2.0), at(), 10.0, 1.0);
        assert!(close(plan.end_speed(), 12.0));
        assert!(close(plan.distance_at(2.0), 22.0));
        assert_eq!(plan.end_time(), SimTime(3.0));
    }
}

// ── Batch planning ────────────────────────────────────────────────────────────

#[cfg(test)]
mod batch {
    use super::*;

    #[test]
    fn plans_every_gtu_in_id_order() {
        let world = World::default().with(road(2, 10.0)).with(road(0, 12.0));
        let mut planners = vec![planner(2), planner(1), planner(0)];
        let requests: Vec<PlanRequest> = planners.iter().map(|p| p.request(SimTime(0.0), at())).collect();
        let mut ctx = PlanContext::new();
        let results = plan_all(&mut planners, &requests, &world, &mut ctx).unwrap();

        let ids: Vec<GtuId> = results.iter().map(|(g, _)| *g).collect();
        assert_eq!(ids, vec![GtuId(0), GtuId(1), GtuId(2)]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(TacticalError::NotOnNetwork(_))));
        assert_eq!(ctx.counters.plans, 2);
        assert_eq!(ctx.counters.structural_failures, 1);
    }

    #[test]
    fn request_count_mismatch_errors() {
        let mut planners = vec![planner(0), planner(1)];
        let requests = vec![planners[0].request(SimTime(0.0), at())];
        let result = plan_all(&mut planners, &requests, &World::default(), &mut PlanContext::new());
        assert!(matches!(result, Err(TacticalError::CountMismatch { expected: 2, got: 1, .. })));
    }

    #[test]
    fn counters_merge() {
        let mut a = PlannerCounters { plans: 2, yields: 1, ..Default::default() };
        a += &PlannerCounters { plans: 3, fallbacks: 1, ..Default::default() };
        assert_eq!(a.plans, 5);
        assert_eq!(a.yields, 1);
        assert_eq!(a.fallbacks, 1);
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use super::*;

    #[test]
    fn reader_overrides_defaults() {
        let csv = "name,value\nT0,1.5\n lookahead ,200\n";
        let params = load_parameters_reader(csv.as_bytes()).unwrap();
        assert_eq!(params.get(Param::T0).unwrap(), 1.5);
        assert_eq!(params.get(Param::Lookahead).unwrap(), 200.0);
        assert_eq!(params.get(Param::Socio).unwrap(), 0.5);
    }

    #[test]
    fn bad_rows_fail_at_load_time() {
        let unknown = load_parameters_reader("name,value\nWARP,1\n".as_bytes());
        assert!(matches!(unknown, Err(TacticalError::Parameter(ParameterError::Unknown(_)))));

        let bound = load_parameters_reader("name,value\nSOCIO,2.0\n".as_bytes());
        assert!(matches!(bound, Err(TacticalError::Parameter(ParameterError::OutOfBounds { .. }))));

        let order = load_parameters_reader("name,value\nDFREE,0.9\n".as_bytes());
        assert!(matches!(order, Err(TacticalError::Parameter(ParameterError::Inconsistent(_)))));

        let parse = load_parameters_reader("name,value\nT0,fast\n".as_bytes());
        assert!(matches!(parse, Err(TacticalError::Parse(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,value").unwrap();
        writeln!(file, "BCRIT,4.0").unwrap();
        file.flush().unwrap();
        let params = load_parameters_csv(file.path()).unwrap();
        assert_eq!(params.get(Param::Bcrit).unwrap(), 4.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_parameters_csv(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(TacticalError::Io(_))));
    }

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.replanning_interval, 0.5);
        assert!(!config.mandatory_dominance);
        assert!(!config.defer_distant_conflicts);
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod factory {
    use super::*;
    use crate::factory::{FSPEED_MEAN, FSPEED_STD_DEV};

    #[test]
    fn sampling_is_deterministic_per_gtu() {
        let factory = PlannerFactory::new(ParameterSet::defaults(), 42).unwrap();
        let a = factory.parameters(GtuId(7)).unwrap().get(Param::Fspeed).unwrap();
        let b = factory.parameters(GtuId(7)).unwrap().get(Param::Fspeed).unwrap();
        let c = factory.parameters(GtuId(8)).unwrap().get(Param::Fspeed).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        for f in [a, c] {
            assert!((f - FSPEED_MEAN).abs() <= 3.0 * FSPEED_STD_DEV + 1e-12);
        }
    }

    #[test]
    fn zero_deviation_uses_mean() {
        let factory = PlannerFactory::new(ParameterSet::defaults(), 1).unwrap().fspeed(1.1, 0.0);
        let planner = factory.create(GtuId(3)).unwrap();
        assert_eq!(planner.gtu(), GtuId(3));
        assert_eq!(planner.params().get(Param::Fspeed).unwrap(), 1.1);
        assert_eq!(planner.conflicts().gtu(), GtuId(3));
    }

    #[test]
    fn config_reaches_planner() {
        let config = PlannerConfig {
            replanning_interval: 0.2,
            mandatory_dominance: true,
            defer_distant_conflicts: true,
        };
        let factory = PlannerFactory::new(ParameterSet::defaults(), 1).unwrap().config(config);
        let planner = factory.create(GtuId(0)).unwrap();
        assert_eq!(planner.config(), &config);
        assert_eq!(planner.request(SimTime(0.0), at()).interval, 0.2);
    }
}
