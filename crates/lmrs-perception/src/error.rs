use lmrs_core::GtuId;
use thiserror::Error;

use crate::Category;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PerceptionError {
    /// A required perception category was not supplied for this epoch.
    #[error("{gtu}: missing perception category {category}")]
    MissingCategory { gtu: GtuId, category: Category },

    /// The GTU is no longer registered on any lane.
    #[error("{0} is not on the network")]
    NotOnNetwork(GtuId),
}

pub type PerceptionResult<T> = Result<T, PerceptionError>;
