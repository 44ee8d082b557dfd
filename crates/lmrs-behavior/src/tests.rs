//! Unit tests for lmrs-behavior.

use lmrs_core::{GtuId, LateralDirection, Param, ParameterSet, RelativeLane, SimTime};
use lmrs_perception::{
    EgoKinematics, InfrastructureRecord, LaneNeighbors, PerceivedGtu, RoadSideDistraction,
    Snapshot, SnapshotBuilder,
};

use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

const LIMIT: f64 = 30.0;

/// Three-lane road, empty, ego at `speed`.
fn road(speed: f64) -> SnapshotBuilder {
    SnapshotBuilder::new(GtuId(0), SimTime::ZERO)
        .ego(EgoKinematics::new(speed))
        .neighbors(RelativeLane::Current, LaneNeighbors::default())
        .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT))
        .infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT))
        .infrastructure(RelativeLane::Right, InfrastructureRecord::new(LIMIT))
}

fn gtu(id: u32, distance: f64, speed: f64) -> PerceivedGtu {
    PerceivedGtu::new(GtuId(id), distance, speed)
}

fn eval(incentive: Incentive, snap: &Snapshot, params: &ParameterSet, mandatory: Desire) -> Desire {
    let ctx = IncentiveContext::new(snap, params, LIMIT);
    incentive.determine_desire(&ctx, mandatory)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[cfg(test)]
mod desire {
    use super::*;

    #[test]
    fn clamps_above_one_only() {
        let d = Desire::new(1.7, -0.2);
        assert_eq!(d.left(), 1.0);
        assert_eq!(d.right(), -0.2);
        let d = Desire::new(-3.0, 0.4);
        assert_eq!(d.left(), -3.0);
    }

    #[test]
    fn ties_go_left() {
        let d = Desire::new(0.5, 0.5);
        assert!(d.left_is_larger_or_equal());
        assert_eq!(d.dominant(), (LateralDirection::Left, 0.5));
        assert_eq!(Desire::new(0.2, 0.3).dominant().0, LateralDirection::Right);
    }

    #[test]
    fn sum_reclamps() {
        let d = Desire::new(0.8, 0.1) + Desire::new(0.5, -0.4);
        assert_eq!(d.left(), 1.0);
        assert!(close(d.right(), -0.3));
    }
}

#[cfg(test)]
mod car_following {
    use super::*;

    fn following(params: &ParameterSet, v: f64) -> Following {
        Following::new(params, v, LIMIT).unwrap()
    }

    #[test]
    fn free_flow_acceleration() {
        let p = ParameterSet::defaults();
        let a = IdmPlus.acceleration(&p, following(&p, 15.0), None).unwrap();
        let expected = 1.25 * (1.0 - 0.5f64.powi(4));
        assert!(close(a, expected), "got {a}");
    }

    #[test]
    fn desired_speed_respects_fspeed_and_vmax() {
        let p = ParameterSet::defaults().with(Param::Fspeed, 1.1).unwrap();
        assert!(close(IdmPlus.desired_speed(&p, 20.0).unwrap(), 22.0));
        assert!(close(IdmPlus.desired_speed(&p, 100.0).unwrap(), 50.0));
    }

    #[test]
    fn equilibrium_gap_is_s0_plus_vt() {
        let p = ParameterSet::defaults().with(Param::T0, 1.5).unwrap();
        let v_leader = 15.0;
        let (mut v, mut gap) = (10.0, 60.0);
        let dt = 0.05;
        for _ in 0..20_000 {
            let a = IdmPlus
                .acceleration(&p, following(&p, v), Some(LeaderState::new(gap, v_leader)))
                .unwrap();
            v = (v + a * dt).max(0.0);
            gap += (v_leader - v) * dt;
        }
        let s0 = p.get(Param::S0).unwrap();
        assert!((v - v_leader).abs() < 1e-3, "speed {v}");
        assert!((gap - (s0 + v_leader * 1.5)).abs() < 0.05, "gap {gap}");
    }

    #[test]
    fn exactly_at_equilibrium_no_acceleration() {
        let p = ParameterSet::defaults();
        let v = 20.0;
        let gap = 3.0 + v * 1.2;
        let a = IdmPlus
            .acceleration(&p, following(&p, v), Some(LeaderState::new(gap, v)))
            .unwrap();
        assert!(a.abs() < 1e-9, "got {a}");
    }

    #[test]
    fn defensive_following_bounded_by_bcrit() {
        let p = ParameterSet::defaults();
        let leaders = [gtu(1, 2.0, 0.0)];
        let plain = IdmPlus.follow_leaders(&p, following(&p, 25.0), &leaders).unwrap();
        let defensive = IdmPlus.follow_defensive(&p, following(&p, 25.0), &leaders).unwrap();
        assert!(plain < -3.5);
        assert_eq!(defensive, -3.5);
    }

    #[test]
    fn stopping_decelerates_at_least_kinematically() {
        let p = ParameterSet::defaults();
        let (v, d) = (15.0, 50.0);
        let f = following(&p, v).with_stopping_distance(1.5);
        let a = IdmPlus.stop(&p, f, d).unwrap();
        assert!(a <= -(v * v) / (2.0 * d), "got {a}");
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let mut p = ParameterSet::defaults();
        p.unset(Param::Delta);
        assert!(IdmPlus.acceleration(&p, following(&ParameterSet::defaults(), 5.0), None).is_err());
    }
}

#[cfg(test)]
mod task_demand {
    use super::*;
    use crate::task_demand::{headway_demand, lane_changing_demand, min_task_headway};

    #[test]
    fn headway_demand_formula() {
        let (b, t_min) = (2.09, 0.56);
        assert_eq!(headway_demand(None, 0.0, b, t_min), 0.0);
        assert_eq!(headway_demand(Some(0.5), 0.0, b, t_min), 1.0);
        assert_eq!(headway_demand(Some(0.56), 0.0, b, t_min), 1.0);
        assert_eq!(headway_demand(Some(3.5), 0.0, b, t_min), 0.5);
        let h = 1.78;
        let expected = 1.0 - 0.5 * (h - t_min) / (3.0 - t_min);
        assert!(close(headway_demand(Some(h), 0.0, b, t_min), expected));
        assert!(close(headway_demand(Some(3.0), 0.0, b, t_min), 0.5));
    }

    #[test]
    fn hard_braking_stretches_min_headway() {
        let (b, t_min) = (2.0, 0.6);
        assert_eq!(min_task_headway(-1.0, b, t_min), t_min);
        let h_min = min_task_headway(-5.0, b, t_min);
        assert!(close(h_min, 0.6 * (1.0 + 3.0 / 6.0)));
        assert_eq!(headway_demand(Some(0.85), -5.0, b, t_min), 1.0);
    }

    #[test]
    fn headway_demand_never_rises_with_headway() {
        let b = 2.09;
        for (a, t_min) in [(0.0, 0.56), (-1.0, 0.8), (-6.0, 0.56)] {
            let h_min = min_task_headway(a, b, t_min);
            let steps = 200;
            let mut prev = headway_demand(Some(h_min), a, b, t_min);
            assert_eq!(prev, 1.0);
            for i in 1..=steps {
                let h = h_min + (3.0 - h_min) * i as f64 / steps as f64;
                let demand = headway_demand(Some(h), a, b, t_min);
                assert!((0.0..=1.0).contains(&demand), "demand {demand} at h = {h}");
                assert!(demand <= prev, "demand rose from {prev} to {demand} at h = {h}");
                prev = demand;
            }
            assert!(close(prev, 0.5));
        }
    }

    #[test]
    fn lane_changing_channel_ignores_negative_desire() {
        assert_eq!(lane_changing_demand(&Desire::new(-0.4, -0.1)), 0.0);
        assert_eq!(lane_changing_demand(&Desire::new(0.3, 0.7)), 0.7);
    }

    #[test]
    fn estimate_uses_cached_speed_and_distraction() {
        let snap = road(20.0)
            .leader(RelativeLane::Current, gtu(1, 20.0, 20.0))
            .distraction(RoadSideDistraction::new(0.4, -5.0, 100.0))
            .build()
            .unwrap();
        let td = TaskDemand::estimate(&snap, &ParameterSet::defaults()).unwrap();
        // h = 1 s
        let expected = 1.0 - 0.5 * (1.0 - 0.56) / (3.0 - 0.56);
        assert!(close(td.headway, expected));
        assert_eq!(td.distraction, 0.4);
        assert_eq!(td.lane_changing, 0.0);
        assert!(close(td.load(), expected));
        let td = td.with_lane_changing(&Desire::new(0.6, 0.1));
        assert_eq!(td.lane_changing, 0.6);
    }
}

#[cfg(test)]
mod route {
    use super::*;
    use crate::incentive::{leave_desire, move_desire};

    #[test]
    fn no_distance_left_means_full_desire() {
        for v in [0.0, 5.0, 30.0] {
            assert_eq!(leave_desire(0.0, 1, v, 295.0, 1.2), 1.0);
        }
    }

    #[test]
    fn no_required_change_means_no_desire() {
        assert_eq!(leave_desire(10.0, 0, 20.0, 295.0, 1.2), 0.0);
    }

    #[test]
    fn two_changes_in_hundred_metres() {
        // max(1 − 100/400, 1 − 5/3) = 0.75
        let d = leave_desire(100.0, 2, 20.0, 200.0, 1.5);
        assert!(close(d, 0.75), "got {d}");
    }

    #[test]
    fn distance_and_time_terms() {
        // Distance term: 1 − 60/295; time term negative.
        let d = leave_desire(60.0, 1, 40.0, 295.0, 1.2);
        assert!(close(d, 1.0 - 60.0 / 295.0));
        // Short lookahead: the time term 1 − 0.75/3 wins.
        let d = leave_desire(30.0, 1, 40.0, 20.0, 3.0);
        assert!(close(d, 0.75));
    }

    #[test]
    fn move_desire_rules() {
        assert_eq!(move_desire(0.6, 0.0), 0.6);
        assert_eq!(move_desire(0.0, 0.6), -0.6);
        assert_eq!(move_desire(0.4, 0.4), 0.0);
    }

    #[test]
    fn route_incentive_points_toward_route() {
        let snap = road(20.0)
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT).with_route(100.0, 1))
            .infrastructure(RelativeLane::Right, InfrastructureRecord::new(LIMIT).with_route(100.0, 2))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let d = eval(Incentive::Route, &snap, &p, Desire::ZERO);
        let current = leave_desire(100.0, 1, 20.0, 295.0, 1.2);
        let right = leave_desire(100.0, 2, 20.0, 295.0, 1.2);
        assert!(close(d.left(), current));
        assert!(close(d.right(), -right));
    }

    #[test]
    fn absent_adjacent_lane_gives_zero() {
        let snap = SnapshotBuilder::new(GtuId(0), SimTime::ZERO)
            .ego(EgoKinematics::new(20.0))
            .neighbors(RelativeLane::Current, LaneNeighbors::default())
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT).with_route(0.0, 1))
            .build()
            .unwrap();
        let d = eval(Incentive::Route, &snap, &ParameterSet::defaults(), Desire::ZERO);
        assert_eq!(d, Desire::ZERO);
    }
}

#[cfg(test)]
mod voluntary {
    use super::*;

    #[test]
    fn speed_prefers_faster_left_lane() {
        let snap = road(20.0)
            .leader(RelativeLane::Current, gtu(1, 20.0, 15.0))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let d = eval(Incentive::Speed, &snap, &p, Desire::ZERO);
        let v_cur = 15.0 + (LIMIT - 15.0) * 20.0 / 295.0;
        let expected = (LIMIT - v_cur) / p.get(Param::Vgain).unwrap();
        assert!(close(d.left(), expected), "got {}", d.left());
        // Right lane just as fast, but no undertaking at 20 m/s > VCONG.
        assert_eq!(d.right(), 0.0);
    }

    #[test]
    fn speed_allows_right_gain_in_congestion() {
        let snap = road(5.0)
            .leader(RelativeLane::Current, gtu(1, 5.0, 3.0))
            .leader(RelativeLane::Left, gtu(2, 5.0, 3.0))
            .build()
            .unwrap();
        let d = eval(Incentive::Speed, &snap, &ParameterSet::defaults(), Desire::ZERO);
        assert!(d.right() > 0.0);
        assert!(close(d.left(), 0.0));
    }

    #[test]
    fn speed_discourages_slower_lane() {
        let snap = road(20.0)
            .leader(RelativeLane::Left, gtu(2, 5.0, 5.0))
            .build()
            .unwrap();
        let d = eval(Incentive::Speed, &snap, &ParameterSet::defaults(), Desire::ZERO);
        assert!(d.left() < 0.0);
    }

    #[test]
    fn keep_right_unless_route_objects() {
        let snap = road(20.0).build().unwrap();
        let p = ParameterSet::defaults();
        assert_eq!(eval(Incentive::Keep, &snap, &p, Desire::ZERO), Desire::new(0.0, 0.365));
        assert_eq!(eval(Incentive::Keep, &snap, &p, Desire::new(0.0, -0.2)), Desire::ZERO);

        let no_right = SnapshotBuilder::new(GtuId(0), SimTime::ZERO)
            .ego(EgoKinematics::new(20.0))
            .neighbors(RelativeLane::Current, LaneNeighbors::default())
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT))
            .build()
            .unwrap();
        assert_eq!(eval(Incentive::Keep, &no_right, &p, Desire::ZERO), Desire::ZERO);
    }

    #[test]
    fn hierarchal_makes_way_for_faster_follower() {
        let snap = road(20.0)
            .follower(RelativeLane::Current, gtu(1, 10.0, 28.0))
            .follower(RelativeLane::Left, gtu(2, 15.0, 30.0))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let d = eval(Incentive::Hierarchal, &snap, &p, Desire::ZERO);
        let v_gain = p.get(Param::Vgain).unwrap();
        assert!(close(d.right(), 0.5 * 8.0 / v_gain));
        assert!(close(d.left(), -0.5 * 10.0 / v_gain));
    }

    #[test]
    fn hierarchal_inactive_in_congestion() {
        let snap = road(5.0)
            .follower(RelativeLane::Current, gtu(1, 10.0, 15.0))
            .build()
            .unwrap();
        assert_eq!(eval(Incentive::Hierarchal, &snap, &ParameterSet::defaults(), Desire::ZERO), Desire::ZERO);
    }

    #[test]
    fn get_in_lane_tops_up_toward_congested_target() {
        let snap = road(20.0)
            .leader(RelativeLane::Right, gtu(1, 0.0, 5.0))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let d = eval(Incentive::GetInLane, &snap, &p, Desire::new(0.0, 0.4));
        let c = 1.0 - 5.0 / p.get(Param::Vcong).unwrap();
        assert!(close(d.right(), c * 0.6));
        assert_eq!(d.left(), 0.0);
    }

    #[test]
    fn get_in_lane_avoids_congested_dead_end() {
        let snap = road(20.0)
            .infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT).with_dead_end())
            .leader(RelativeLane::Left, gtu(1, 0.0, 0.0))
            .build()
            .unwrap();
        let d = eval(Incentive::GetInLane, &snap, &ParameterSet::defaults(), Desire::ZERO);
        assert!(close(d.left(), -0.5));
    }

    #[test]
    fn zero_congestion_speed_disables_congestion_rules() {
        let p = ParameterSet::defaults().with(Param::Vcong, 0.0).unwrap();
        let queue = road(20.0)
            .infrastructure(RelativeLane::Left, InfrastructureRecord::new(LIMIT).with_dead_end())
            .leader(RelativeLane::Left, gtu(1, 0.0, 0.0))
            .leader(RelativeLane::Right, gtu(2, 0.0, 0.0))
            .build()
            .unwrap();
        let d = eval(Incentive::GetInLane, &queue, &p, Desire::new(0.0, 0.4));
        assert_eq!(d, Desire::ZERO);

        // Hierarchal stays active at any speed.
        let slow = road(5.0)
            .follower(RelativeLane::Current, gtu(1, 10.0, 15.0))
            .build()
            .unwrap();
        let d = eval(Incentive::Hierarchal, &slow, &p, Desire::ZERO);
        assert!(close(d.right(), 0.5 * 10.0 / p.get(Param::Vgain).unwrap()));
    }

    #[test]
    fn missing_parameter_contributes_zero() {
        let snap = road(20.0).build().unwrap();
        let mut p = ParameterSet::defaults();
        p.unset(Param::Dfree);
        assert_eq!(eval(Incentive::Keep, &snap, &p, Desire::ZERO), Desire::ZERO);
    }
}

#[cfg(test)]
mod synthesis {
    use super::*;
    use crate::synthesis::theta;

    #[test]
    fn empty_road_without_route_has_no_desire() {
        let snap = SnapshotBuilder::new(GtuId(0), SimTime::ZERO)
            .ego(EgoKinematics::new(20.0))
            .neighbors(RelativeLane::Current, LaneNeighbors::default())
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let s = DesireSynthesizer::default().synthesize(&IncentiveContext::new(&snap, &p, LIMIT));
        assert_eq!(s.desire, Desire::ZERO);
        assert_eq!(s.contributions.len(), 5);
    }

    #[test]
    fn mandatory_plus_voluntary_sum_clamped() {
        let snap = road(20.0)
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT).with_route(0.0, 1))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let s = DesireSynthesizer::default().synthesize(&IncentiveContext::new(&snap, &p, LIMIT));
        // Route: left 1, right 1.  Keep adds DFREE right; clamps at 1.
        assert_eq!(s.mandatory, Desire::new(1.0, 1.0));
        assert_eq!(s.desire.right(), 1.0);
        assert_eq!(s.desire.left(), 1.0);
        assert!(s.desire.left_is_larger_or_equal());
    }

    #[test]
    fn voluntary_only_synthesizer_sums() {
        let snap = road(20.0)
            .follower(RelativeLane::Current, gtu(1, 10.0, 28.0))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let synth = DesireSynthesizer::new().with(Incentive::Keep).with(Incentive::Hierarchal);
        let s = synth.synthesize(&IncentiveContext::new(&snap, &p, LIMIT));
        let v_gain = p.get(Param::Vgain).unwrap();
        assert!(close(s.desire.right(), 0.365 + 0.5 * 8.0 / v_gain));
        assert_eq!(s.mandatory, Desire::ZERO);
    }

    #[test]
    fn lane_change_in_progress_overrides() {
        let snap = road(20.0).lane_change_in_progress(LateralDirection::Right).build().unwrap();
        let p = ParameterSet::defaults();
        let s = DesireSynthesizer::default().synthesize(&IncentiveContext::new(&snap, &p, LIMIT));
        assert_eq!(s.desire, Desire::new(0.0, 1.0));
    }

    #[test]
    fn theta_weighting() {
        assert_eq!(theta(0.5, -1.0, 0.577, 0.8), 1.0);
        assert_eq!(theta(0.9, 1.0, 0.577, 0.8), 1.0);
        assert_eq!(theta(0.9, -1.0, 0.577, 0.8), 0.0);
        let mid = theta(0.7, -1.0, 0.577, 0.8);
        assert!(close(mid, (0.8 - 0.7) / (0.8 - 0.577)));
    }

    #[test]
    fn mandatory_dominance_suppresses_opposing_voluntary() {
        // Route pushes left at ~0.93; the left lane is much slower.
        let snap = road(20.0)
            .infrastructure(RelativeLane::Current, InfrastructureRecord::new(LIMIT).with_route(20.0, 1))
            .leader(RelativeLane::Left, gtu(1, 5.0, 5.0))
            .build()
            .unwrap();
        let p = ParameterSet::defaults();
        let ctx = IncentiveContext::new(&snap, &p, LIMIT);
        let synth = DesireSynthesizer::new().with(Incentive::Route).with(Incentive::Speed);
        let plain = synth.synthesize(&ctx);
        let weighted = synth.clone().with_mandatory_dominance(true).synthesize(&ctx);

        let route_left = 1.0 - 20.0 / 295.0;
        assert!(close(plain.mandatory.left(), route_left));
        assert!(close(plain.voluntary.left(), -1.0));
        assert!(plain.desire.left() < 0.0);
        assert!(close(weighted.desire.left(), route_left));
    }
}
