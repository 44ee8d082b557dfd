//! The validated per-epoch perception snapshot and its builder.

use std::fmt;

use lmrs_core::{GtuId, LateralDirection, RelativeLane, SimTime};
use tracing::debug;

use crate::{
    EgoKinematics, InfrastructureRecord, LaneNeighbors, PerceivedConflict, PerceivedGtu,
    PerceptionError, PerceptionResult, RoadSideDistraction,
};

// ── Category ──────────────────────────────────────────────────────────────────

/// Perception categories that must be present for a snapshot to build.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Ego,
    Neighbors,
    Infrastructure,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Ego            => "ego",
            Category::Neighbors      => "neighbors",
            Category::Infrastructure => "infrastructure",
        })
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Everything one GTU perceives at the start of an epoch.
///
/// Immutable once built.  Adjacent lanes exist iff they carry an
/// infrastructure record; per-lane accessors return empty slices for lanes
/// that do not exist.
#[derive(Clone, Debug)]
pub struct Snapshot {
    gtu:            GtuId,
    time:           SimTime,
    ego:            EgoKinematics,
    neighbors:      [LaneNeighbors; 3],
    infrastructure: [Option<InfrastructureRecord>; 3],
    current:        InfrastructureRecord,
    conflicts:      Vec<PerceivedConflict>,
    distractions:   Vec<RoadSideDistraction>,
    lane_change:    LateralDirection,
}

impl Snapshot {
    #[inline]
    pub fn gtu(&self) -> GtuId {
        self.gtu
    }

    #[inline]
    pub fn time(&self) -> SimTime {
        self.time
    }

    #[inline]
    pub fn ego(&self) -> &EgoKinematics {
        &self.ego
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.ego.speed
    }

    /// `true` for the current lane and for adjacent lanes with an
    /// infrastructure record.
    #[inline]
    pub fn lane_exists(&self, lane: RelativeLane) -> bool {
        self.infrastructure[lane.index()].is_some()
    }

    pub fn neighbors(&self, lane: RelativeLane) -> &LaneNeighbors {
        &self.neighbors[lane.index()]
    }

    #[inline]
    pub fn leaders(&self, lane: RelativeLane) -> &[PerceivedGtu] {
        &self.neighbors[lane.index()].leaders
    }

    #[inline]
    pub fn followers(&self, lane: RelativeLane) -> &[PerceivedGtu] {
        &self.neighbors[lane.index()].followers
    }

    #[inline]
    pub fn infrastructure(&self, lane: RelativeLane) -> Option<&InfrastructureRecord> {
        self.infrastructure[lane.index()].as_ref()
    }

    /// Current-lane infrastructure; always present in a built snapshot.
    #[inline]
    pub fn current_infrastructure(&self) -> &InfrastructureRecord {
        &self.current
    }

    /// All perceived conflicts, ascending by distance.
    #[inline]
    pub fn conflicts(&self) -> &[PerceivedConflict] {
        &self.conflicts
    }

    /// Conflicts on one relative lane, ascending by distance.
    pub fn conflicts_on(&self, lane: RelativeLane) -> impl Iterator<Item = &PerceivedConflict> + '_ {
        self.conflicts.iter().filter(move |c| c.lane == lane)
    }

    /// Distraction segments the ego is currently inside.
    pub fn current_distractions(&self) -> impl Iterator<Item = &RoadSideDistraction> + '_ {
        self.distractions.iter().filter(|d| d.is_current())
    }

    /// Lane change in progress at the start of the epoch.
    #[inline]
    pub fn lane_change_in_progress(&self) -> LateralDirection {
        self.lane_change
    }
}

// ── SnapshotBuilder ───────────────────────────────────────────────────────────

/// Collects perception categories, then validates them into a [`Snapshot`].
///
/// Ego kinematics, current-lane neighbors, and current-lane infrastructure
/// are required.  An empty road must be stated explicitly with
/// `neighbors(RelativeLane::Current, LaneNeighbors::default())`; adjacent
/// lanes default to no neighbors.  Conflicts and distraction default to
/// none.
#[derive(Clone, Debug)]
pub struct SnapshotBuilder {
    gtu:            GtuId,
    time:           SimTime,
    ego:            Option<EgoKinematics>,
    neighbors:      [Option<LaneNeighbors>; 3],
    infrastructure: [Option<InfrastructureRecord>; 3],
    conflicts:      Vec<PerceivedConflict>,
    distractions:   Vec<RoadSideDistraction>,
    lane_change:    LateralDirection,
}

impl SnapshotBuilder {
    pub fn new(gtu: GtuId, time: SimTime) -> Self {
        Self {
            gtu,
            time,
            ego: None,
            neighbors: [None, None, None],
            infrastructure: [None, None, None],
            conflicts: Vec::new(),
            distractions: Vec::new(),
            lane_change: LateralDirection::None,
        }
    }

    pub fn ego(mut self, ego: EgoKinematics) -> Self {
        self.ego = Some(ego);
        self
    }

    /// Replace all neighbors on `lane`.
    pub fn neighbors(mut self, lane: RelativeLane, neighbors: LaneNeighbors) -> Self {
        self.neighbors[lane.index()] = Some(neighbors);
        self
    }

    /// Add one leader on `lane`; creates the lane's neighbor category.
    pub fn leader(mut self, lane: RelativeLane, gtu: PerceivedGtu) -> Self {
        self.neighbors[lane.index()].get_or_insert_with(LaneNeighbors::default).leaders.push(gtu);
        self
    }

    /// Add one follower on `lane`; creates the lane's neighbor category.
    pub fn follower(mut self, lane: RelativeLane, gtu: PerceivedGtu) -> Self {
        self.neighbors[lane.index()].get_or_insert_with(LaneNeighbors::default).followers.push(gtu);
        self
    }

    pub fn infrastructure(mut self, lane: RelativeLane, record: InfrastructureRecord) -> Self {
        self.infrastructure[lane.index()] = Some(record);
        self
    }

    pub fn conflict(mut self, conflict: PerceivedConflict) -> Self {
        self.conflicts.push(conflict);
        self
    }

    pub fn distraction(mut self, distraction: RoadSideDistraction) -> Self {
        self.distractions.push(distraction);
        self
    }

    pub fn lane_change_in_progress(mut self, lat: LateralDirection) -> Self {
        self.lane_change = lat;
        self
    }

    #[inline]
    pub fn gtu(&self) -> GtuId {
        self.gtu
    }

    /// Ego speed if ego kinematics were supplied; used by fallback planning
    /// when the snapshot itself cannot be built.
    #[inline]
    pub fn ego_speed(&self) -> Option<f64> {
        self.ego.map(|e| e.speed)
    }

    /// Validate and freeze.
    ///
    /// Sorts every neighbor and conflict list by ascending distance so that
    /// early-terminating collectors see the closest GTUs first.
    pub fn build(self) -> PerceptionResult<Snapshot> {
        let gtu = self.gtu;
        let missing = |category: Category| {
            debug!(%gtu, %category, "perception category missing");
            PerceptionError::MissingCategory { gtu, category }
        };

        let ego = self.ego.ok_or_else(|| missing(Category::Ego))?;
        let cur = RelativeLane::Current.index();
        if self.neighbors[cur].is_none() {
            return Err(missing(Category::Neighbors));
        }
        let current = self.infrastructure[cur].ok_or_else(|| missing(Category::Infrastructure))?;

        let mut neighbors = self.neighbors.map(Option::unwrap_or_default);
        for lane in &mut neighbors {
            lane.sort();
        }

        let mut conflicts = self.conflicts;
        for c in &mut conflicts {
            c.sort();
        }
        conflicts.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(Snapshot {
            gtu,
            time: self.time,
            ego,
            neighbors,
            infrastructure: self.infrastructure,
            current,
            conflicts,
            distractions: self.distractions,
            lane_change: self.lane_change,
        })
    }
}
