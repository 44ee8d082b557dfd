//! Ego kinematics and perceived neighbors.

use lmrs_core::{GtuId, IndicatorIntent, LateralDirection};

use crate::Within;

/// Default vehicle length when the perception source does not report one.
pub const DEFAULT_LENGTH: f64 = 4.5;

// ── EgoKinematics ─────────────────────────────────────────────────────────────

/// The ego GTU's own state at the start of the epoch.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EgoKinematics {
    pub speed:        f64,
    pub acceleration: f64,
    pub length:       f64,
    pub width:        f64,
}

impl EgoKinematics {
    pub fn new(speed: f64) -> Self {
        Self { speed, acceleration: 0.0, length: DEFAULT_LENGTH, width: 2.0 }
    }

    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }
}

// ── PerceivedGtu ──────────────────────────────────────────────────────────────

/// A neighboring GTU as seen from the ego: headway plus the signals other
/// drivers can observe.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerceivedGtu {
    pub id:            GtuId,
    /// Net distance, metres.  See the crate docs for sign conventions.
    pub distance:      f64,
    pub speed:         f64,
    pub acceleration:  f64,
    pub length:        f64,
    /// Desired speed, when it can be estimated (e.g. from vehicle class).
    pub desired_speed: Option<f64>,
    pub indicator:     IndicatorIntent,
    /// Lane change the neighbor is currently executing.
    pub lane_change:   LateralDirection,
}

impl PerceivedGtu {
    pub fn new(id: GtuId, distance: f64, speed: f64) -> Self {
        Self {
            id,
            distance,
            speed,
            acceleration:  0.0,
            length:        DEFAULT_LENGTH,
            desired_speed: None,
            indicator:     IndicatorIntent::None,
            lane_change:   LateralDirection::None,
        }
    }

    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_desired_speed(mut self, desired_speed: f64) -> Self {
        self.desired_speed = Some(desired_speed);
        self
    }

    pub fn with_indicator(mut self, indicator: IndicatorIntent) -> Self {
        self.indicator = indicator;
        self
    }

    /// `true` if this GTU is alongside (overlapping longitudinally).
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.distance < 0.0
    }
}

// ── LaneNeighbors ─────────────────────────────────────────────────────────────

/// Leaders and followers on one relative lane, each sorted by ascending
/// distance.  The ordering is established by
/// [`SnapshotBuilder::build`][crate::SnapshotBuilder::build].
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneNeighbors {
    pub leaders:   Vec<PerceivedGtu>,
    pub followers: Vec<PerceivedGtu>,
}

impl LaneNeighbors {
    pub fn new(leaders: Vec<PerceivedGtu>, followers: Vec<PerceivedGtu>) -> Self {
        Self { leaders, followers }
    }

    #[inline]
    pub fn first_leader(&self) -> Option<&PerceivedGtu> {
        self.leaders.first()
    }

    #[inline]
    pub fn first_follower(&self) -> Option<&PerceivedGtu> {
        self.followers.first()
    }

    /// Leaders whose distance does not exceed `range`.
    pub fn leaders_within(&self, range: f64) -> Within<'_> {
        Within::new(&self.leaders, range)
    }

    pub(crate) fn sort(&mut self) {
        self.leaders.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        self.followers.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }
}
