//! Upcoming right-of-way conflicts as perceived by the ego.

use lmrs_core::{ConflictId, IndicatorIntent, RelativeLane};

use crate::PerceivedGtu;

/// Geometry class of a conflict.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictKind {
    /// Two lanes join; vehicles end up on the same lane.
    Merge,
    /// Two lanes cross; the conflict area is shared only briefly.
    Crossing,
    /// One lane splits; only downstream vehicles on the split matter.
    Split,
}

/// Right-of-way rule on the ego's approach to a conflict.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictRule {
    /// The ego has right of way.
    Priority,
    /// The ego gives way to conflicting traffic.
    #[default]
    GiveWay,
    /// The ego stops at the line, then gives way.
    Stop,
    /// Every approach stops; GTUs proceed in order of arrival.
    AllStop,
}

impl ConflictRule {
    /// Rules that require a full stop before entering.
    #[inline]
    pub fn requires_stop(self) -> bool {
        matches!(self, ConflictRule::Stop | ConflictRule::AllStop)
    }
}

/// One conflict on the ego's path or on an adjacent lane.
///
/// `upstream` GTUs approach the conflict on the conflicting lane; their
/// `distance` is from their front to the conflict start.  `downstream` GTUs
/// have entered it; their `distance` is from the conflict start to their
/// rear, so a value below `length` means the GTU still occupies the
/// conflict area.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerceivedConflict {
    pub id:                      ConflictId,
    pub lane:                    RelativeLane,
    pub kind:                    ConflictKind,
    /// Distance from the ego front to the conflict start.  Negative once
    /// the ego has entered the conflict.
    pub distance:                f64,
    pub length:                  f64,
    pub rule:                    ConflictRule,
    pub upstream:                Vec<PerceivedGtu>,
    pub downstream:              Vec<PerceivedGtu>,
    pub conflicting_speed_limit: f64,
    /// How far upstream along the conflicting lane the ego can see.  `None`
    /// means unobstructed.
    pub visibility:              Option<f64>,
    /// Indicator the ego should show when approaching this conflict.
    pub turn:                    IndicatorIntent,
    /// Revision of the conflict's geometry; a change resets the decision.
    pub geometry:                u32,
}

impl PerceivedConflict {
    /// A conflict with [`ConflictRule::Priority`] or [`ConflictRule::GiveWay`].
    pub fn new(id: ConflictId, kind: ConflictKind, distance: f64, priority: bool) -> Self {
        Self {
            id,
            lane: RelativeLane::Current,
            kind,
            distance,
            length: 5.0,
            rule: if priority { ConflictRule::Priority } else { ConflictRule::GiveWay },
            upstream: Vec::new(),
            downstream: Vec::new(),
            conflicting_speed_limit: 50.0 / 3.6,
            visibility: None,
            turn: IndicatorIntent::None,
            geometry: 0,
        }
    }

    pub fn on_lane(mut self, lane: RelativeLane) -> Self {
        self.lane = lane;
        self
    }

    pub fn with_rule(mut self, rule: ConflictRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_upstream(mut self, gtu: PerceivedGtu) -> Self {
        self.upstream.push(gtu);
        self
    }

    pub fn with_downstream(mut self, gtu: PerceivedGtu) -> Self {
        self.downstream.push(gtu);
        self
    }

    pub fn with_conflicting_speed_limit(mut self, v: f64) -> Self {
        self.conflicting_speed_limit = v;
        self
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_turn(mut self, turn: IndicatorIntent) -> Self {
        self.turn = turn;
        self
    }

    pub fn with_geometry(mut self, geometry: u32) -> Self {
        self.geometry = geometry;
        self
    }

    /// `true` if the ego's approach has right of way.
    #[inline]
    pub fn is_priority(&self) -> bool {
        self.rule == ConflictRule::Priority
    }

    /// Distance from the ego front to the conflict end.
    #[inline]
    pub fn end_distance(&self) -> f64 {
        self.distance + self.length
    }

    /// `true` while the ego front has not yet reached the conflict.
    #[inline]
    pub fn is_ahead(&self) -> bool {
        self.distance > 0.0
    }

    /// Downstream GTUs that still occupy the conflict area.
    pub fn occupants(&self) -> impl Iterator<Item = &PerceivedGtu> + '_ {
        self.downstream.iter().filter(move |g| g.distance < self.length)
    }

    pub(crate) fn sort(&mut self) {
        self.upstream.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        self.downstream.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }
}
