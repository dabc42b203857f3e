//! Error types for the retrieval core.

use crate::DocId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The query could not be parsed as a boolean expression. The message explains why
    /// so the caller can correct the input and retry.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Two documents handed to the index share the same external id.
    #[error("duplicate document id: {0}")]
    DuplicateDocument(DocId),

    /// A ranking model name that is not one of boolean, extended-boolean or vector.
    #[error("unknown ranking model: {0}")]
    UnknownModel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Error::InvalidQuery(_))
    }
}
