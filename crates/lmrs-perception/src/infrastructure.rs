//! Per-lane route and infrastructure information.

/// What the ego knows about one relative lane's infrastructure.
///
/// The record's presence in a snapshot is what makes an adjacent lane exist;
/// a lane without a record cannot be targeted by a lane change.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfrastructureRecord {
    /// Distance within which the required lane changes must be completed,
    /// metres.  `f64::INFINITY` if the route imposes none.
    pub remaining_distance: f64,
    /// Lane changes needed from this lane to stay on the route.
    pub required_changes:   u32,
    /// The lane ends without continuation ahead.
    pub dead_end:           bool,
    pub speed_limit:        f64,
    /// Distance over which a legal lane change from the current lane into
    /// this one remains possible.  Unused on the current lane.
    pub legal_change:       f64,
}

impl InfrastructureRecord {
    /// A lane with no route requirement, the given speed limit, and
    /// unrestricted lane changes.
    pub fn new(speed_limit: f64) -> Self {
        Self {
            remaining_distance: f64::INFINITY,
            required_changes:   0,
            dead_end:           false,
            speed_limit,
            legal_change:       f64::INFINITY,
        }
    }

    pub fn with_route(mut self, remaining_distance: f64, required_changes: u32) -> Self {
        self.remaining_distance = remaining_distance;
        self.required_changes = required_changes;
        self
    }

    pub fn with_dead_end(mut self) -> Self {
        self.dead_end = true;
        self
    }

    pub fn with_legal_change(mut self, legal_change: f64) -> Self {
        self.legal_change = legal_change;
        self
    }

    /// `true` if a lane change into this lane is legal right now.
    #[inline]
    pub fn change_allowed(&self) -> bool {
        self.legal_change > 0.0
    }
}

/// A stretch of road-side distraction (accident scene, advertising, ...).
///
/// `start` and `end` are measured from the ego front; the segment is current
/// while the ego is inside it.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSideDistraction {
    /// Task demand imposed while current, in [0, 1].
    pub value: f64,
    pub start: f64,
    pub end:   f64,
}

impl RoadSideDistraction {
    pub fn new(value: f64, start: f64, end: f64) -> Self {
        Self { value: value.clamp(0.0, 1.0), start, end }
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        self.start <= 0.0 && self.end >= 0.0
    }
}
