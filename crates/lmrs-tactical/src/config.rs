//! Planner settings and the CSV parameter loader.
//!
//! # CSV format
//!
//! One row per parameter, matched case-insensitively against
//! [`Param::name`][lmrs_core::Param::name].  Unlisted parameters keep their
//! defaults.
//!
//! ```csv
//! name,value
//! T0,1.5
//! LOOKAHEAD,200
//! socio,0.3
//! ```
//!
//! Bounds are checked per row and the cross-parameter ordering
//! `DFREE ≤ DSYNC ≤ DCOOP` once all rows are applied, so a bad file fails
//! here rather than during planning.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use lmrs_core::ParameterSet;

use crate::{TacticalError, TacticalResult};

/// Replanning interval used when a request carries none, seconds.
pub const DEFAULT_REPLANNING_INTERVAL: f64 = 0.5;

/// Settings that shape planning but are not driver parameters.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerConfig {
    /// Validity window for requests without a usable interval, seconds.
    pub replanning_interval: f64,
    /// Scale down voluntary desire that opposes a strong mandatory desire.
    pub mandatory_dominance: bool,
    /// Leave conflicts beyond the comfortable stopping distance undecided.
    pub defer_distant_conflicts: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            replanning_interval: DEFAULT_REPLANNING_INTERVAL,
            mandatory_dominance: false,
            defer_distant_conflicts: false,
        }
    }
}

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ParameterRecord {
    name:  String,
    value: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`ParameterSet`] from a CSV file, starting from the defaults.
pub fn load_parameters_csv(path: &Path) -> TacticalResult<ParameterSet> {
    let file = std::fs::File::open(path)?;
    load_parameters_reader(file)
}

/// Like [`load_parameters_csv`] but accepts any `Read` source.
pub fn load_parameters_reader<R: Read>(reader: R) -> TacticalResult<ParameterSet> {
    apply_parameters_reader(ParameterSet::defaults(), reader)
}

/// Override `base` with the rows of a CSV source.
pub fn apply_parameters_reader<R: Read>(mut base: ParameterSet, reader: R) -> TacticalResult<ParameterSet> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    for result in csv_reader.deserialize::<ParameterRecord>() {
        let row = result.map_err(|e| TacticalError::Parse(e.to_string()))?;
        base.set_by_name(&row.name, row.value)?;
    }
    base.validate()?;
    Ok(base)
}
