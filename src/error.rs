use crate::retrieval::error::RetrievalError;
use crate::utils::track::TrackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcrsrError {
    /// Represents a bad input track file
    #[error("{0}")]
    Track(#[from] TrackError),

    /// Represents a failed retrieval batch
    #[error("{0}")]
    Retrieval(#[from] RetrievalError),

    /// The output table could not be persisted
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
