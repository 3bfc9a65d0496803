//! Domain services. Each one is constructed once with the shared pool and cloned
//! into request handlers through `AppState`.

pub mod auth;
pub mod categories;
pub mod micropost_categories;
pub mod microposts;
pub mod users;

use rusqlite::ErrorCode;

pub use auth::{AuthService, LoginOutcome};
pub use categories::CategoryService;
pub use micropost_categories::MicropostCategoryService;
pub use microposts::{MicropostService, NewMicropost};
pub use users::UserService;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ServiceError {
    /// True when the store rejected a write because a referenced row does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        )
    }

    /// True when the store rejected a write because of a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
