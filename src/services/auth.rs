use std::sync::Arc;

use crate::auth::{password, Claims, TokenKeys};
use crate::db::models::User;
use crate::services::{ServiceError, ServiceResult, UserService};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    keys: TokenKeys,
    admin_emails: Arc<Vec<String>>,
}

impl AuthService {
    pub fn new(users: UserService, keys: TokenKeys, admin_emails: Vec<String>) -> Self {
        Self {
            users,
            keys,
            admin_emails: Arc::new(admin_emails),
        }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Hash the password and create the user. Duplicate email is `Conflict`.
    pub fn register(&self, name: &str, email: &str, password: &str) -> ServiceResult<User> {
        let is_admin = self
            .admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email));

        let result = self
            .users
            .hash_password(password)
            .and_then(|hash| self.users.create(name, email, &hash, is_admin));

        match result {
            Ok(user) => {
                tracing::info!("User registered: id={} admin={}", user.id, user.is_admin);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!("Registration failed for {}: {}", email, e);
                Err(e)
            }
        }
    }

    /// Verify credentials and sign a token. Unknown email and wrong password
    /// both yield `Unauthorized`.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let credentials = self
            .users
            .find_by_email(email)?
            .ok_or(ServiceError::Unauthorized)?;

        if !password::verify_password(password, &credentials.password_hash) {
            return Err(ServiceError::Unauthorized);
        }

        let token = self.keys.issue(&credentials.user)?;
        Ok(LoginOutcome {
            token,
            user: credentials.user,
        })
    }

    /// Tokens are stateless; the client discards its copy.
    pub fn logout(&self) -> bool {
        true
    }

    pub fn verify(&self, token: &str) -> ServiceResult<Claims> {
        self.keys.verify(token).map_err(|_| ServiceError::Unauthorized)
    }
}
