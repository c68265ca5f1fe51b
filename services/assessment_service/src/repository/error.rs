use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found.")]
    NotFound,

    #[error("Record already exists.")]
    Duplicate,

    #[error("Limit reached.")]
    LimitReached,

    #[error(transparent)]
    Backend(#[from] rusqlite::Error),

    #[error("Stored document is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Store task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}
