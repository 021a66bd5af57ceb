// Dashboard error type shared by the domain and application layers
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("tile id '{0}' already exists")]
    DuplicateId(String),

    #[error("tile '{0}' not found")]
    NotFound(String),

    /// The in-memory mutation was applied; only the write to the store failed.
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
