use deadpool_sqlite::InteractError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failed checks on caller-supplied data, accumulated so the caller can
/// report all of them at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("validation failed: {}", .error_messages.join("; "))]
pub struct ValidationError {
    pub error_messages: Vec<String>,
}

impl ValidationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { error_messages: vec![message.into()] }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no authenticated user")]
    NotAuthenticated,
    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("database pool error: {0}")]
    Pool(String),
}

impl From<InteractError> for Error {
    fn from(err: InteractError) -> Self {
        Error::Pool(err.to_string())
    }
}
