use thiserror::Error;

/// Failures surfaced by a [`DirectoryStore`](super::DirectoryStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint on `phone` violated (Postgres SQLSTATE 23505).
    #[error("a user with this phone number already exists")]
    Conflict,

    /// The sqlx message is part of the display text, so it is not exposed again as a source.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::Conflict,
            _ => Self::Database(err),
        }
    }
}
