//! Lateral directions, relative lanes, and turn-indicator intent.
//!
//! These three enums are deliberately distinct: a `LateralDirection` is a
//! movement, a `RelativeLane` indexes perception data, and an
//! `IndicatorIntent` is an externally visible signal.

/// Direction of a lateral movement relative to the direction of travel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LateralDirection {
    #[default]
    None,
    Left,
    Right,
}

impl LateralDirection {
    /// The opposite side; `None` stays `None`.
    #[inline]
    pub fn flip(self) -> LateralDirection {
        match self {
            LateralDirection::None  => LateralDirection::None,
            LateralDirection::Left  => LateralDirection::Right,
            LateralDirection::Right => LateralDirection::Left,
        }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        matches!(self, LateralDirection::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LateralDirection::None  => "none",
            LateralDirection::Left  => "left",
            LateralDirection::Right => "right",
        }
    }
}

impl std::fmt::Display for LateralDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── RelativeLane ──────────────────────────────────────────────────────────────

/// A lane relative to the one the GTU currently occupies.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelativeLane {
    Current,
    Left,
    Right,
}

impl RelativeLane {
    pub const ALL: [RelativeLane; 3] = [RelativeLane::Current, RelativeLane::Left, RelativeLane::Right];

    /// Dense index for `[T; 3]` per-lane arrays.
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            RelativeLane::Current => 0,
            RelativeLane::Left    => 1,
            RelativeLane::Right   => 2,
        }
    }

    /// Lateral direction from the current lane to this one.
    #[inline]
    pub fn lateral(self) -> LateralDirection {
        match self {
            RelativeLane::Current => LateralDirection::None,
            RelativeLane::Left    => LateralDirection::Left,
            RelativeLane::Right   => LateralDirection::Right,
        }
    }
}

impl From<LateralDirection> for RelativeLane {
    fn from(lat: LateralDirection) -> Self {
        match lat {
            LateralDirection::None  => RelativeLane::Current,
            LateralDirection::Left  => RelativeLane::Left,
            LateralDirection::Right => RelativeLane::Right,
        }
    }
}

// ── Turn indicator ────────────────────────────────────────────────────────────

/// Which turn indicator a GTU wants lit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndicatorIntent {
    #[default]
    None,
    Left,
    Right,
}

impl From<LateralDirection> for IndicatorIntent {
    fn from(lat: LateralDirection) -> Self {
        match lat {
            LateralDirection::None  => IndicatorIntent::None,
            LateralDirection::Left  => IndicatorIntent::Left,
            LateralDirection::Right => IndicatorIntent::Right,
        }
    }
}

/// Indicator intent plus the distance to the object that triggered it.
///
/// When several sources request an indicator in the same epoch the closest
/// object wins; see [`TurnIndicator::merge`].
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnIndicator {
    pub intent:   IndicatorIntent,
    /// Distance to the triggering object, metres.  `f64::INFINITY` when off.
    pub distance: f64,
}

impl TurnIndicator {
    pub const OFF: TurnIndicator = TurnIndicator {
        intent:   IndicatorIntent::None,
        distance: f64::INFINITY,
    };

    pub fn new(intent: IndicatorIntent, distance: f64) -> Self {
        Self { intent, distance }
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.intent != IndicatorIntent::None
    }

    /// Keep whichever request refers to the closer object.
    pub fn merge(&mut self, other: TurnIndicator) {
        if other.is_on() && (!self.is_on() || other.distance < self.distance) {
            *self = other;
        }
    }
}

impl Default for TurnIndicator {
    fn default() -> Self {
        Self::OFF
    }
}
