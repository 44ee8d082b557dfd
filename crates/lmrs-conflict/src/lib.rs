//! `lmrs-conflict` — who goes first at merges and crossings.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`plan`]    | `ConflictAction`, `ConflictPlan`, `StopPhase`: decision memory |
//! | [`store`]   | `ConflictPlans`: one GTU's arena of plans, keyed by conflict   |
//! | [`gap`]     | time-to-cover kinematics and gap acceptance                    |
//! | [`engine`]  | `ConflictEngine`: per-epoch approach logic                     |
//! | [`error`]   | `ConflictError`, `ConflictResult<T>`                           |
//!
//! # Decision model
//!
//! Every conflict on the ego's path is `Undecided` until first evaluated,
//! then `Yield` or `Go`:
//!
//! 1. A priority approach goes when the conflicting stream leaves at least
//!    `CONFLICT_GAP` seconds, unless a standing leader would leave the ego
//!    stuck on the conflict.
//! 2. A give-way approach goes when the ego clears the conflict
//!    `TIME_FACTOR`-safely before any conflicting GTU arrives.
//! 3. A stop approach first stands still within `STOP_AREA`, then gives way.
//! 4. An all-stop approach first stands still within `STOP_AREA`, then goes
//!    once no conflicting GTU waiting there arrived earlier and the
//!    conflict is empty.
//! 5. Otherwise the ego yields: it stops before the conflict as if behind a
//!    stationary leader, never braking harder than `BCRIT`, and short of
//!    any crossing with conflicting traffic it could not clear.  A GTU that
//!    was not yet yielding and can no longer stop within `BCRIT` goes.
//!
//! At a priority merge where the ego stopped to let a conflicting GTU in,
//! that GTU is remembered and the ego keeps yielding until it has merged
//! (zip merging).
//!
//! Go under priority, or after a stop, is sticky: it holds until the
//! conflict is passed, its geometry changes, or it leaves perception.  Plans
//! are created on first sight and dropped when the conflict disappears.
//!
//! The GTU is *blocking* while any plan forces a Yield on a conflict not yet
//! reached, and while it stands still inside a conflict.
//!
//! With [`ConflictContext::deferring_distant`], nothing is decided while the
//! nearest conflict lies beyond `S0 + length + v²/2B`.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `fx-hash` | FxHash for the plan arena instead of SipHash.            |

pub mod engine;
pub mod error;
pub mod gap;
pub mod plan;
pub mod store;


pub use engine::{ConflictContext, ConflictEngine, ConflictOutcome};
pub use error::{ConflictError, ConflictResult};
pub use plan::{ConflictAction, ConflictPlan, StopPhase};
pub use store::ConflictPlans;
