//! A toy on-ramp: two main-road lanes and a ramp that merges into the right
//! lane.  Positions share one longitudinal axis along the main road.

use lmrs_core::{ConflictId, GtuId, LaneId, LanePosition, RelativeLane, SimTime};
use lmrs_perception::{
    ConflictKind, EgoKinematics, InfrastructureRecord, LaneNeighbors, PerceivedConflict, PerceivedGtu,
    PerceptionError, PerceptionResult, PerceptionSource, SnapshotBuilder,
};
use lmrs_tactical::OperationalPlan;

// ── Layout ────────────────────────────────────────────────────────────────────

pub const RIGHT: LaneId = LaneId(0);
pub const LEFT:  LaneId = LaneId(1);
pub const RAMP:  LaneId = LaneId(2);

/// Start of the merge conflict, metres.
pub const MERGE_AT:    f64 = 400.0;
pub const MERGE_LEN:   f64 = 20.0;
pub const ROAD_END:    f64 = 1_200.0;
pub const MAIN_LIMIT:  f64 = 100.0 / 3.6;
pub const RAMP_LIMIT:  f64 = 70.0 / 3.6;
/// Sight distance along the main road from the ramp.
pub const VISIBILITY:  f64 = 150.0;

const MERGE: ConflictId = ConflictId(1);

// ── Vehicles ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id:           GtuId,
    pub lane:         LaneId,
    /// Front position, metres.
    pub position:     f64,
    pub speed:        f64,
    pub acceleration: f64,
    pub length:       f64,
}

impl Vehicle {
    pub fn new(id: u32, lane: LaneId, position: f64, speed: f64) -> Self {
        Self { id: GtuId(id), lane, position, speed, acceleration: 0.0, length: 4.5 }
    }

    pub fn location(&self) -> LanePosition {
        LanePosition::new(self.lane, self.position)
    }

    fn rear(&self) -> f64 {
        self.position - self.length
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// Epoch-start state.  Perception reads it; [`World::apply`] advances it
/// once every plan of the epoch is known.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub vehicles: Vec<Vehicle>,
}

impl World {
    fn find(&self, gtu: GtuId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == gtu)
    }

    fn adjacent(lane: LaneId, side: RelativeLane) -> Option<LaneId> {
        match (lane, side) {
            (l, RelativeLane::Current)      => Some(l),
            (RIGHT, RelativeLane::Left)     => Some(LEFT),
            (LEFT, RelativeLane::Right)     => Some(RIGHT),
            _                               => None,
        }
    }

    fn neighbors(&self, ego: &Vehicle, lane: LaneId) -> LaneNeighbors {
        let mut neighbors = LaneNeighbors::default();
        for other in self.vehicles.iter().filter(|o| o.lane == lane && o.id != ego.id) {
            let gtu = |distance: f64| {
                PerceivedGtu::new(other.id, distance, other.speed)
                    .with_acceleration(other.acceleration)
                    .with_length(other.length)
            };
            if other.position >= ego.position {
                neighbors.leaders.push(gtu(other.rear() - ego.position));
            } else {
                neighbors.followers.push(gtu(ego.rear() - other.position));
            }
        }
        neighbors
    }

    /// The merge as seen from `ego`, if it is still on an approach.
    fn merge_conflict(&self, ego: &Vehicle) -> Option<PerceivedConflict> {
        let priority = match ego.lane {
            RIGHT => true,
            RAMP  => false,
            _     => return None,
        };
        if ego.rear() > MERGE_AT + MERGE_LEN {
            return None;
        }
        let other_approach = if priority { RAMP } else { RIGHT };
        let mut conflict = PerceivedConflict::new(MERGE, ConflictKind::Merge, MERGE_AT - ego.position, priority)
            .with_length(MERGE_LEN)
            .with_conflicting_speed_limit(if priority { RAMP_LIMIT } else { MAIN_LIMIT });
        if !priority {
            conflict = conflict.with_visibility(VISIBILITY);
        }
        for other in self.vehicles.iter().filter(|o| o.id != ego.id) {
            if other.lane == other_approach && other.position < MERGE_AT {
                let distance = MERGE_AT - other.position;
                if priority || distance <= VISIBILITY {
                    conflict = conflict.with_upstream(PerceivedGtu::new(other.id, distance, other.speed));
                }
            } else if other.lane == RIGHT && other.rear() >= MERGE_AT && other.position > ego.position {
                conflict = conflict.with_downstream(PerceivedGtu::new(other.id, other.rear() - MERGE_AT, other.speed));
            }
        }
        Some(conflict)
    }

    /// Move every vehicle along its plan for `dt` seconds.  Lane changes
    /// complete instantly; ramp vehicles past the merge join the right lane.
    pub fn apply(&mut self, plans: &[OperationalPlan], dt: f64) {
        for plan in plans {
            let Some(v) = self.vehicles.iter_mut().find(|v| v.id == plan.gtu) else {
                continue;
            };
            v.acceleration = plan.acceleration();
            v.position += plan.distance_at(dt);
            v.speed = plan.speed_at(dt);
            if let Some(lc) = plan.lane_change {
                let side = RelativeLane::from(lc.direction);
                if let Some(target) = Self::adjacent(v.lane, side) {
                    v.lane = target;
                }
            }
            if v.lane == RAMP && v.rear() > MERGE_AT {
                v.lane = RIGHT;
            }
        }
    }

    pub fn remove(&mut self, gtu: GtuId) {
        self.vehicles.retain(|v| v.id != gtu);
    }
}

impl PerceptionSource for World {
    fn perceive(&self, gtu: GtuId, time: SimTime, _location: LanePosition) -> PerceptionResult<SnapshotBuilder> {
        let Some(ego) = self.find(gtu).filter(|v| v.position <= ROAD_END) else {
            return Err(PerceptionError::NotOnNetwork(gtu));
        };
        let limit = if ego.lane == RAMP { RAMP_LIMIT } else { MAIN_LIMIT };
        let mut builder = SnapshotBuilder::new(gtu, time)
            .ego(EgoKinematics::new(ego.speed).with_acceleration(ego.acceleration).with_length(ego.length));

        for side in RelativeLane::ALL {
            let Some(lane) = Self::adjacent(ego.lane, side) else {
                continue;
            };
            let record = if side == RelativeLane::Current {
                InfrastructureRecord::new(limit)
            } else {
                InfrastructureRecord::new(MAIN_LIMIT)
            };
            builder = builder
                .neighbors(side, self.neighbors(ego, lane))
                .infrastructure(side, record);
        }
        if let Some(conflict) = self.merge_conflict(ego) {
            builder = builder.conflict(conflict);
        }
        Ok(builder)
    }
}
