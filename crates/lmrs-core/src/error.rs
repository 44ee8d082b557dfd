//! Parameter configuration errors.
//!
//! Every other crate wraps `ParameterError` in its own enum via `#[from]`.

use thiserror::Error;

use crate::Bound;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("parameter {name} = {value} is out of bounds ({bound})")]
    OutOfBounds {
        name:  &'static str,
        value: f64,
        bound: Bound,
    },

    #[error("parameter {0} is not set")]
    Missing(&'static str),

    #[error("unknown parameter name {0:?}")]
    Unknown(String),

    #[error("inconsistent parameters: {0}")]
    Inconsistent(String),
}

/// Shorthand result type for parameter access and configuration.
pub type ParameterResult<T> = Result<T, ParameterError>;
