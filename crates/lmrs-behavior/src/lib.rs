//! `lmrs-behavior` — the driver model: how much a GTU wants to change lanes,
//! how busy it is, and how it follows its leader.
//!
//! Everything here is a pure function of one [`Snapshot`] and one
//! [`ParameterSet`]; nothing is remembered between epochs.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                 |
//! |-------------------|----------------------------------------------------------|
//! | [`desire`]        | `Desire` (left, right), clamped at 1                     |
//! | [`incentive`]     | `Incentive` enum and the five incentive formulas         |
//! | [`synthesis`]     | `DesireSynthesizer`, `Synthesis`                         |
//! | [`task_demand`]   | `TaskDemand` and the per-channel estimators              |
//! | [`car_following`] | `CarFollowingModel` trait, `IdmPlus`, `Following`        |
//!
//! [`Snapshot`]: lmrs_perception::Snapshot
//! [`ParameterSet`]: lmrs_core::ParameterSet

pub mod car_following;
pub mod desire;
pub mod incentive;
pub mod synthesis;
pub mod task_demand;

#[cfg(test)]
mod tests;

pub use car_following::{CarFollowingModel, Following, IdmPlus, LeaderState};
pub use desire::Desire;
pub use incentive::{Incentive, IncentiveContext};
pub use synthesis::{DesireSynthesizer, Synthesis};
pub use task_demand::TaskDemand;
