use thiserror::Error;

use estimo_core::estimator::persistence::StoreError;

pub mod memory;
pub mod state;

pub use memory::InMemoryStateStore;
pub use state::SqlStateStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(sqlx::Error::PoolTimedOut)
            | RepositoryError::Database(sqlx::Error::PoolClosed) => {
                Self::Unavailable(error.to_string())
            }
            other => Self::Operation(other.to_string()),
        }
    }
}
