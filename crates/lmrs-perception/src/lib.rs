//! `lmrs-perception` — what a GTU knows about its surroundings in one epoch.
//!
//! A [`Snapshot`] is assembled fresh at each replanning epoch by an external
//! [`PerceptionSource`] through a [`SnapshotBuilder`], validated once, and
//! then only read.  Nothing in it survives to the next epoch.
//!
//! # Crate layout
//!
//! | Module             | Contents                                              |
//! |--------------------|-------------------------------------------------------|
//! | [`headway`]        | `EgoKinematics`, `PerceivedGtu`, `LaneNeighbors`      |
//! | [`infrastructure`] | `InfrastructureRecord`, `RoadSideDistraction`         |
//! | [`conflict`]       | `ConflictKind`, `ConflictRule`, `PerceivedConflict`   |
//! | [`snapshot`]       | `Snapshot`, `SnapshotBuilder`, `Category`             |
//! | [`collect`]        | `Within` iterator, anticipation and headway folds     |
//! | [`source`]         | `PerceptionSource` trait                              |
//! | [`error`]          | `PerceptionError`, `PerceptionResult`                 |
//!
//! # Distance conventions
//!
//! All distances are net (bumper to bumper) and measured along the lane:
//! a leader's `distance` is from the ego front to its rear, a follower's from
//! its front to the ego rear.  Negative values mean longitudinal overlap,
//! i.e. a GTU alongside on an adjacent lane.

pub mod collect;
pub mod conflict;
pub mod error;
pub mod headway;
pub mod infrastructure;
pub mod snapshot;
pub mod source;


pub use collect::{anticipated_speed, task_headway, Within};
pub use conflict::{ConflictKind, ConflictRule, PerceivedConflict};
pub use error::{PerceptionError, PerceptionResult};
pub use headway::{EgoKinematics, LaneNeighbors, PerceivedGtu};
pub use infrastructure::{InfrastructureRecord, RoadSideDistraction};
pub use snapshot::{Category, Snapshot, SnapshotBuilder};
pub use source::PerceptionSource;
