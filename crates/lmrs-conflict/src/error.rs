use lmrs_core::ParameterError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConflictError {
    #[error("conflict resolution parameter: {0}")]
    Parameter(#[from] ParameterError),
}

pub type ConflictResult<T> = Result<T, ConflictError>;
