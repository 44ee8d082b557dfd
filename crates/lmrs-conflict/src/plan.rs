//! Decision memory for a single conflict.

use std::fmt;

use lmrs_core::{ConflictId, SimTime};
use lmrs_perception::{ConflictKind, ConflictRule, PerceivedConflict};

/// What the GTU has committed to do at a conflict.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictAction {
    #[default]
    Undecided,
    Yield,
    Go,
}

impl fmt::Display for ConflictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictAction::Undecided => "undecided",
            ConflictAction::Yield     => "yield",
            ConflictAction::Go        => "go",
        })
    }
}

/// Progress through a stop line at a stop or all-stop conflict.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopPhase {
    /// Not yet stood still within `STOP_AREA` of the conflict.
    #[default]
    Approach,
    /// Stood still at the line; waiting for the way to clear.
    Stopped,
    /// Left the line; Go holds like on a priority approach.
    Run,
}

/// Cross-epoch state for one (GTU, conflict) pair.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictPlan {
    pub conflict:   ConflictId,
    pub action:     ConflictAction,
    /// Go was committed on a priority approach, or after a stop, and may
    /// not regress.
    pub sticky:     bool,
    /// The GTU stands still inside this conflict.
    pub blocking:   bool,
    pub stop_phase: StopPhase,
    /// When the GTU first came within `STOP_AREA` of a stop-rule conflict.
    pub arrival:    Option<SimTime>,
    /// The GTU front has reached the conflict; the decision is final.
    pub passed:     bool,
    pub first_seen: SimTime,
    pub last_seen:  SimTime,
    // Approach identity; any change resets the plan.
    kind:           ConflictKind,
    rule:           ConflictRule,
    geometry:       u32,
}

impl ConflictPlan {
    pub(crate) fn new(conflict: &PerceivedConflict, now: SimTime) -> Self {
        Self {
            conflict:   conflict.id,
            action:     ConflictAction::Undecided,
            sticky:     false,
            blocking:   false,
            passed:     false,
            stop_phase: StopPhase::Approach,
            arrival:    None,
            first_seen: now,
            last_seen:  now,
            kind:       conflict.kind,
            rule:       conflict.rule,
            geometry:   conflict.geometry,
        }
    }

    /// `true` if `conflict` is still the approach this plan was made for.
    pub fn matches(&self, conflict: &PerceivedConflict) -> bool {
        self.kind == conflict.kind
            && self.rule == conflict.rule
            && self.geometry == conflict.geometry
    }

    #[inline]
    pub fn is_sticky_go(&self) -> bool {
        self.sticky && self.action == ConflictAction::Go
    }

    /// `true` while this plan holds the GTU back: Yield committed and the
    /// conflict not yet reached.
    #[inline]
    pub fn forces_yield(&self) -> bool {
        self.action == ConflictAction::Yield && !self.passed
    }

    /// Record a decision; `hold` makes a Go sticky.  A sticky Go or a passed
    /// conflict ignores it.
    pub(crate) fn commit(&mut self, action: ConflictAction, hold: bool) -> bool {
        if self.is_sticky_go() || self.passed {
            return false;
        }
        let changed = self.action != action;
        self.action = action;
        self.sticky = hold && action == ConflictAction::Go;
        changed
    }
}
