//! `lmrs-core` — foundational types for the `lmrs` tactical behavior engine.
//!
//! This crate is a dependency of every other `lmrs-*` crate.  It has no
//! `lmrs-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! All physical quantities in the workspace are plain `f64` SI magnitudes:
//! metres, seconds, m/s, m/s².
//!
//! # What lives here
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`ids`]         | `GtuId`, `LaneId`, `ConflictId`                         |
//! | [`time`]        | `SimTime`, `TimeWindow`                                 |
//! | [`direction`]   | `LateralDirection`, `RelativeLane`, `TurnIndicator`     |
//! | [`params`]      | `Param`, `ParameterType`, `Bound`, `ParameterSet`       |
//! | [`rng`]         | `GtuRng` (per-GTU)                                      |
//! | [`error`]       | `ParameterError`, `ParameterResult`                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public value types.      |

pub mod direction;
pub mod error;
pub mod ids;
pub mod params;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use direction::{IndicatorIntent, LateralDirection, RelativeLane, TurnIndicator};
pub use error::{ParameterError, ParameterResult};
pub use ids::{ConflictId, GtuId, LaneId};
pub use params::{Bound, Param, ParameterSet, ParameterType};
pub use rng::GtuRng;
pub use time::{LanePosition, SimTime, TimeWindow};
