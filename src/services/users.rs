use rusqlite::{params, OptionalExtension};

use crate::auth::password;
use crate::db::models::{User, UserCredentials};
use crate::services::{ServiceError, ServiceResult};
use crate::state::DbPool;

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(pool: DbPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// Insert a user. The returned record never includes the hash.
    pub fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> ServiceResult<User> {
        let conn = self.pool.get()?;
        let result = conn.query_row(
            "INSERT INTO users (name, email, password_hash, is_admin) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, email, is_admin",
            params![name, email, password_hash, is_admin],
            User::from_row,
        );

        match result {
            Ok(user) => Ok(user),
            Err(e) => {
                let err = ServiceError::from(e);
                if err.is_unique_violation() {
                    Err(ServiceError::Conflict(format!(
                        "A user with email {} already exists",
                        email
                    )))
                } else {
                    tracing::error!("Failed to create user {}: {}", email, err);
                    Err(err)
                }
            }
        }
    }

    pub fn find(&self, id: i64) -> ServiceResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, name, email, is_admin FROM users WHERE id = ?1",
                params![id],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list(&self) -> ServiceResult<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name, email, is_admin FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], User::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn count(&self) -> ServiceResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn hash_password(&self, plain: &str) -> ServiceResult<String> {
        Ok(password::hash_password(plain, self.bcrypt_cost)?)
    }

    /// The only lookup that exposes the password hash.
    pub fn find_by_email(&self, email: &str) -> ServiceResult<Option<UserCredentials>> {
        let conn = self.pool.get()?;
        let credentials = conn
            .query_row(
                "SELECT id, name, email, is_admin, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserCredentials {
                        user: User::from_row(row)?,
                        password_hash: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }
}
