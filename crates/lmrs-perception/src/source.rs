//! The seam between the planner and whatever produces perception data.

use lmrs_core::{GtuId, LanePosition, SimTime};

use crate::{PerceptionResult, SnapshotBuilder};

/// Supplies the raw perception of one GTU for one epoch.
///
/// Implementations gather whatever categories they can and hand back an
/// unvalidated [`SnapshotBuilder`]; the planner validates it.  Return
/// [`PerceptionError::NotOnNetwork`][crate::PerceptionError::NotOnNetwork]
/// when the GTU has no lane.
///
/// Planning may run in parallel over many GTUs, hence `Sync`.
pub trait PerceptionSource: Sync {
    fn perceive(
        &self,
        gtu:      GtuId,
        time:     SimTime,
        location: LanePosition,
    ) -> PerceptionResult<SnapshotBuilder>;
}
