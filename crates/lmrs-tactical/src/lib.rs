//! `lmrs-tactical` — per-epoch operational plans for GTUs.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`planner`]     | `TacticalPlanner`, `PlanRequest`: one GTU, one epoch          |
//! | [`operational`] | `OperationalPlan` and its acceleration profile               |
//! | [`lane_change`] | gap acceptance, synchronization, cooperation                 |
//! | [`batch`]       | `plan_all`: many GTUs, optionally parallel                  |
//! | [`context`]     | `PlanContext`, `PlannerCounters`                             |
//! | [`config`]      | `PlannerConfig`, CSV parameter loader                        |
//! | [`factory`]     | `PlannerFactory`: per-GTU sampled parameters                |
//! | [`error`]       | `TacticalError`, `TacticalResult<T>`                         |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Runs [`plan_all`] on Rayon's thread pool.               |
//! | `fx-hash`  | FxHash for the conflict plan arena.                     |
//! | `serde`    | Serialize/Deserialize on plans, counters and config.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use lmrs_core::{GtuId, LaneId, LanePosition, ParameterSet, SimTime};
//! use lmrs_tactical::{PlanContext, TacticalPlanner};
//!
//! let mut planner = TacticalPlanner::new(GtuId(0), ParameterSet::defaults())?;
//! let request = planner.request(SimTime(0.0), LanePosition::new(LaneId(3), 120.0));
//! let plan = planner.request_plan(request, &world, &mut PlanContext::new())?;
//! ```

pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod lane_change;
pub mod operational;
pub mod planner;

#[cfg(test)]
mod tests;

pub use batch::{plan_all, BatchResult};
pub use config::{apply_parameters_reader, load_parameters_csv, load_parameters_reader, PlannerConfig};
pub use context::{PlanContext, PlannerCounters};
pub use error::{TacticalError, TacticalResult};
pub use factory::PlannerFactory;
pub use operational::{AccelerationSegment, LaneChangeIntent, OperationalPlan, PlanKind};
pub use planner::{lane_change_threshold, PlanRequest, TacticalPlanner};
