use thiserror::Error;

/// Store-level failures. Ownership checks live here because edit/delete are
/// contractually author-only; the API layer maps these onto HTTP statuses.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("caller is not the author")]
    NotOwner,

    #[error("comment text must not be empty")]
    EmptyText,

    #[error("replies cannot be nested more than one level")]
    ReplyDepth,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
