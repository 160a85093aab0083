use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::User;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("storage failure: {0}")]
    Storage(#[source] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    pub username: Option<String>,
    pub email_address: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub username: String,
    pub password: String,
}

/// Account registration and credential verification
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new account; duplicate username or email is a conflict
    pub async fn register(&self, payload: RegisterUser) -> Result<Uuid, UserError> {
        let username = require(payload.username.as_deref())?;
        let email_address = require(payload.email_address.as_deref())?;
        let password = require(payload.password.as_deref())?;

        let email_taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE email_address = $1")
                .bind(&email_address)
                .fetch_optional(&self.pool)
                .await
                .map_err(UserError::Storage)?;
        if email_taken.is_some() {
            return Err(UserError::Conflict(
                "Email address already has a user".to_string(),
            ));
        }

        let username_taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(&username)
                .fetch_optional(&self.pool)
                .await
                .map_err(UserError::Storage)?;
        if username_taken.is_some() {
            return Err(UserError::Conflict("Username already exists".to_string()));
        }

        let user_id = Uuid::new_v4();
        let insert = sqlx::query(
            "INSERT INTO users (id, username, email_address, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(&username)
        .bind(&email_address)
        .bind(hash_password(&password))
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => {
                tracing::info!(%user_id, "user registered");
                Ok(user_id)
            }
            // The pre-checks race against concurrent registrations; the
            // unique constraints are the authority
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(UserError::Conflict(
                "Username or email address already exists".to_string(),
            )),
            Err(e) => Err(UserError::Storage(e)),
        }
    }

    /// Verify credentials and return the account
    pub async fn login(&self, payload: &LoginUser) -> Result<User, UserError> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, username, email_address, password_hash, created_at \
             FROM users WHERE username = $1",
        )
        .bind(&payload.username)
        .fetch_optional(&self.pool)
        .await
        .map_err(UserError::Storage)?;

        match user {
            Some(user) if user.password_hash == hash_password(&payload.password) => Ok(user),
            _ => Err(UserError::InvalidCredentials),
        }
    }
}

fn require(value: Option<&str>) -> Result<String, UserError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(UserError::Validation(
            "Missing username, password, or email address".to_string(),
        )),
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_registration_fields_are_rejected() {
        assert!(require(None).is_err());
        assert!(require(Some("")).is_err());
        assert_eq!(require(Some("testuser")).unwrap(), "testuser");
    }

    #[test]
    fn password_hashing_is_stable_and_opaque() {
        let hash = hash_password("password123");
        assert_eq!(hash, hash_password("password123"));
        assert_ne!(hash, hash_password("password124"));
        assert_eq!(hash.len(), 64);
        assert!(!hash.contains("password"));
    }
}
