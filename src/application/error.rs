use thiserror::Error;

use crate::domain::ValidationError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Validation failures can be fixed by retrying with different input.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}
