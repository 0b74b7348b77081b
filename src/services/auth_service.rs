//! Domain service for accounts and API-key authentication.
//!
//! Covers password registration and login, Google sign-in and API key
//! rotation.

use crate::db::User;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User is inactive")]
    InactiveUser,

    #[error("Open registration is disabled")]
    RegistrationClosed,

    #[error("E-mail already registered: {0}")]
    EmailTaken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("External API error: {service} - {message}")]
    ExternalApi { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn google_error(msg: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: "Google".to_string(),
            message: msg.into(),
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a password account. The configured first superuser e-mail is
    /// granted superuser rights.
    ///
    /// # Errors
    ///
    /// - [`AuthError::RegistrationClosed`] when open registration is off
    /// - [`AuthError::EmailTaken`] when the e-mail is already registered
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Verifies credentials and returns the user (with its API key).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Signs in with a Google id token, creating the account on first use.
    async fn login_with_google(&self, id_token: &str) -> Result<User, AuthError>;

    /// Resolves an API key to its active user.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError>;

    /// Regenerates the API key for a user and returns the new one.
    async fn regenerate_api_key(&self, user_id: uuid::Uuid) -> Result<String, AuthError>;
}
