//! Authentication service
//!
//! Provides business logic for local signup, signin, logout, and token refresh.
//! Coordinates between the credential store, the password hasher, and the JWT service.
//!
//! Each user holds at most one refresh-token digest. Issuing a new pair
//! overwrites it, so signing in elsewhere or refreshing invalidates the
//! previous refresh token. Access tokens already issued stay valid until
//! they expire.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::password::{PasswordError, PasswordHasher};
use crate::core::db::repositories::{UserRepositoryError, UserStore};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailAlreadyExists,

    /// Unknown user, wrong password, no active session, or a stale refresh
    /// token. Callers cannot tell these apart.
    #[error("Access denied")]
    AccessDenied,

    /// Missing, malformed, expired, or wrong-kind bearer token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => AuthError::AccessDenied,
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            UserRepositoryError::DatabaseError(_) => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired
            | JwtError::InvalidToken
            | JwtError::InvalidTokenType
            | JwtError::DecodingError(_) => AuthError::Unauthorized,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Local credentials for signup and signin
#[derive(Clone, Deserialize)]
pub struct AuthDto {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AuthDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthDto")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthDto {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.email.is_empty() {
            return Err(AuthError::Validation("email should not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation(
                "password should not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Access and refresh token pair handed to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

fn access_denied(user: impl std::fmt::Display, reason: &str) -> AuthError {
    tracing::warn!(%user, reason, "Access denied");
    AuthError::AccessDenied
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    jwt_service: JwtService,
    hasher: PasswordHasher,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        store: Arc<dyn UserStore>,
        jwt_service: JwtService,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            jwt_service,
            hasher,
        }
    }

    /// Token verifier shared with the request guards
    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Check that the credential store is reachable
    pub async fn health_check(&self) -> Result<(), AuthError> {
        self.store.health_check().await?;
        Ok(())
    }

    /// Register a new user and open their first session
    pub async fn signup_local(&self, dto: AuthDto) -> Result<Tokens, AuthError> {
        let password_hash = self.hash_secret(&dto.password).await?;

        let user = self.store.create(&dto.email, &password_hash).await?;

        let tokens = self.get_tokens(user.id, &user.email).await?;
        self.update_rt_hash(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "User signed up");

        Ok(tokens)
    }

    /// Sign in with email and password, replacing any previous session
    pub async fn signin_local(&self, dto: AuthDto) -> Result<Tokens, AuthError> {
        let user = self
            .store
            .find_by_email(&dto.email)
            .await?
            .ok_or_else(|| access_denied(&dto.email, "unknown email"))?;

        if !self.verify_secret(&user.password_hash, &dto.password).await? {
            return Err(access_denied(&dto.email, "wrong password"));
        }

        let tokens = self.get_tokens(user.id, &user.email).await?;
        self.update_rt_hash(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = %user.id, "User signed in");

        Ok(tokens)
    }

    /// Drop the user's refresh-token digest. Succeeds with no active session.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        let cleared = self.store.clear_refresh_token_hash(user_id).await?;

        tracing::info!(%user_id, cleared, "User logged out");

        Ok(())
    }

    /// Exchange a valid refresh token for a new pair, rotating the stored digest
    pub async fn refresh_tokens(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Tokens, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| access_denied(user_id, "unknown user"))?;

        let stored_hash = user
            .active_session()
            .ok_or_else(|| access_denied(user_id, "no active session"))?;

        if !self.verify_secret(stored_hash, refresh_token).await? {
            return Err(access_denied(user_id, "refresh token superseded"));
        }

        let tokens = self.get_tokens(user.id, &user.email).await?;
        self.update_rt_hash(user.id, &tokens.refresh_token).await?;

        tracing::info!(%user_id, "Tokens refreshed");

        Ok(tokens)
    }

    /// Sign the access and refresh tokens independently
    async fn get_tokens(&self, user_id: Uuid, email: &str) -> Result<Tokens, AuthError> {
        let (access_token, refresh_token) = futures::try_join!(
            async { self.jwt_service.generate_access_token(user_id, email) },
            async { self.jwt_service.generate_refresh_token(user_id, email) },
        )?;

        Ok(Tokens {
            access_token,
            refresh_token,
        })
    }

    /// Store the digest of the newly issued refresh token, overwriting the old one
    async fn update_rt_hash(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AuthError> {
        let hash = self.hash_secret(refresh_token).await?;
        self.store.update_refresh_token_hash(user_id, &hash).await?;
        Ok(())
    }

    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let secret = secret.to_string();

        let hash = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))??;

        Ok(hash)
    }

    async fn verify_secret(&self, digest: &str, secret: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let digest = digest.to_string();
        let secret = secret.to_string();

        let matches = tokio::task::spawn_blocking(move || hasher.verify(&digest, &secret))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))??;

        Ok(matches)
    }
}
