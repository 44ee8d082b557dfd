use lmrs_conflict::ConflictError;
use lmrs_core::{GtuId, ParameterError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TacticalError {
    /// The GTU has no lane; the caller should remove it from the simulation.
    #[error("{0} is not on the network")]
    NotOnNetwork(GtuId),

    #[error("plan requested for {requested} from the planner of {owner}")]
    WrongGtu { owner: GtuId, requested: GtuId },

    #[error("{what} length {got} does not match planner count {expected}")]
    CountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("conflict error: {0}")]
    Conflict(#[from] ConflictError),

    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TacticalError {
    /// `true` for errors after which the GTU cannot be planned at all.
    pub fn is_structural(&self) -> bool {
        matches!(self, TacticalError::NotOnNetwork(_))
    }
}

pub type TacticalResult<T> = Result<T, TacticalError>;
