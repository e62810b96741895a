use thiserror::Error;

use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown account or wrong secret; deliberately indistinguishable.
    #[error("Invalid credentials")]
    Rejected,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Signing secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
