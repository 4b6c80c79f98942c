use std::path::PathBuf;

use calypso_core::SubscriberId;

/// Store failures are terminal for the running operation; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum HlrError {
    #[error("database file not found at {}", .0.display())]
    Missing(PathBuf),
    #[error("could not open database: {0}")]
    Open(#[source] rusqlite::Error),
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("unexpected database schema: {0}")]
    SchemaMismatch(String),
    #[error("update of subscriber {0} affected no rows")]
    NoRowsAffected(SubscriberId),
}

pub type HlrResult<T> = Result<T, HlrError>;
