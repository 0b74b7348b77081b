//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use crate::clients::google::GoogleClient;
use crate::config::Settings;
use crate::db::repositories::is_unique_violation;
use crate::db::repositories::user::NewUser;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, Registration};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct SeaOrmAuthService {
    store: Store,
    settings: Arc<Settings>,
    google: GoogleClient,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, settings: Arc<Settings>, google: GoogleClient) -> Self {
        Self {
            store,
            settings,
            google,
        }
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        if !self.settings.users_open_registration {
            return Err(AuthError::RegistrationClosed);
        }

        if self.store.users().get_by_email(&new_user.email).await?.is_some() {
            return Err(AuthError::EmailTaken(new_user.email));
        }

        let email = new_user.email.clone();
        let user = self
            .store
            .users()
            .create(new_user, self.settings.argon2())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::EmailTaken(email)
                } else {
                    AuthError::from(e)
                }
            })?;

        info!(user_id = %user.id, superuser = user.is_superuser, "Created user {}", user.email);
        metrics::counter!("users_registered_total").increment(1);

        Ok(user)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if registration.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let is_superuser = self.settings.is_first_superuser(&registration.email);

        self.create_user(NewUser {
            email: registration.email,
            name: registration.name,
            avatar_url: None,
            password: Some(registration.password),
            is_superuser,
        })
        .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .users()
            .verify_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }

        Ok(user)
    }

    async fn login_with_google(&self, id_token: &str) -> Result<User, AuthError> {
        let info = self
            .google
            .verify_id_token(id_token)
            .await
            .map_err(|e| AuthError::google_error(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !info.is_email_verified() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = info.email.clone().ok_or(AuthError::InvalidCredentials)?;

        if let Some(user) = self.store.users().get_by_email(&email).await? {
            if !user.is_active {
                return Err(AuthError::InactiveUser);
            }
            return Ok(user);
        }

        let is_superuser = self.settings.is_first_superuser(&email);

        self.create_user(NewUser {
            email,
            name: info.name,
            avatar_url: info.picture,
            password: None,
            is_superuser,
        })
        .await
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.users().get_by_api_key(api_key).await?)
    }

    async fn regenerate_api_key(&self, user_id: Uuid) -> Result<String, AuthError> {
        if self.store.users().get_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let new_api_key = self.store.users().regenerate_api_key(user_id).await?;
        info!(user_id = %user_id, "API key regenerated");

        Ok(new_api_key)
    }
}
