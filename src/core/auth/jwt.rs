//! JWT utilities for token generation and validation
//!
//! Provides JWT token creation and validation using HS256 algorithm.
//! Access and refresh tokens are signed with separate secrets so that each
//! class can only be verified in its own domain. Access tokens are short-lived
//! (15 minutes), refresh tokens are long-lived (7 days).

use chrono::{TimeDelta, Utc};
use derive_more::Display;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token expiration time (15 minutes)
const ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 15;

/// Default refresh token expiration time (7 days)
const REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 7;

/// Upper bound for the access token lifetime (1 day)
const MAX_ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 24 * 60;

/// Upper bound for the refresh token lifetime (1 year)
const MAX_REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 365;

const DEFAULT_ISSUER: &str = "local-auth";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens
    pub access_secret: String,
    /// Secret key for signing refresh tokens
    pub refresh_secret: String,
    /// Access token expiration in minutes
    pub access_token_expiration_minutes: i64,
    /// Refresh token expiration in days
    pub refresh_token_expiration_days: i64,
    /// Token issuer
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field(
                "access_token_expiration_minutes",
                &self.access_token_expiration_minutes,
            )
            .field(
                "refresh_token_expiration_days",
                &self.refresh_token_expiration_days,
            )
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_expiration_minutes: ACCESS_TOKEN_EXPIRATION_MINUTES,
            refresh_token_expiration_days: REFRESH_TOKEN_EXPIRATION_DAYS,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        let access_secret =
            std::env::var("AT_SECRET").map_err(|_| JwtError::MissingSecret("AT_SECRET"))?;
        let refresh_secret =
            std::env::var("RT_SECRET").map_err(|_| JwtError::MissingSecret("RT_SECRET"))?;

        let access_exp = std::env::var("JWT_ACCESS_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(ACCESS_TOKEN_EXPIRATION_MINUTES);

        let refresh_exp = std::env::var("JWT_REFRESH_EXPIRATION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(REFRESH_TOKEN_EXPIRATION_DAYS);

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        let config = Self {
            access_secret,
            refresh_secret,
            access_token_expiration_minutes: access_exp,
            refresh_token_expiration_days: refresh_exp,
            issuer,
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations that would merge the two token domains or
    /// issue tokens with an unusable lifetime
    pub fn validate(&self) -> Result<(), JwtError> {
        if self.access_secret.is_empty() {
            return Err(JwtError::MissingSecret("AT_SECRET"));
        }
        if self.refresh_secret.is_empty() {
            return Err(JwtError::MissingSecret("RT_SECRET"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(JwtError::SharedSecret);
        }
        let access_minutes = self.access_token_expiration_minutes;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRATION_MINUTES).contains(&access_minutes) {
            return Err(JwtError::InvalidLifetime("JWT_ACCESS_EXPIRATION_MINUTES"));
        }
        if !(1..=MAX_REFRESH_TOKEN_EXPIRATION_DAYS).contains(&self.refresh_token_expiration_days) {
            return Err(JwtError::InvalidLifetime("JWT_REFRESH_EXPIRATION_DAYS"));
        }
        Ok(())
    }

    /// Set access token expiration
    pub fn access_token_expiration(mut self, minutes: i64) -> Self {
        self.access_token_expiration_minutes = minutes;
        self
    }

    /// Set refresh token expiration
    pub fn refresh_token_expiration(mut self, days: i64) -> Self {
        self.refresh_token_expiration_days = days;
        self
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("{0} environment variable not set")]
    MissingSecret(&'static str),

    #[error("AT_SECRET and RT_SECRET must differ")]
    SharedSecret,

    #[error("{0} is out of range")]
    InvalidLifetime(&'static str),

    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token type")]
    InvalidTokenType,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer => JwtError::InvalidToken,
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// Token type enum
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    /// Get user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Signing and verification keys for one token class
#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    access_keys: KeyPair,
    refresh_keys: KeyPair,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let access_keys = KeyPair::from_secret(&config.access_secret);
        let refresh_keys = KeyPair::from_secret(&config.refresh_secret);

        Self {
            config,
            access_keys,
            refresh_keys,
        }
    }

    /// Create JWT service from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        let config = JwtConfig::from_env()?;
        Ok(Self::new(config))
    }

    fn keys(&self, token_type: TokenType) -> &KeyPair {
        match token_type {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    fn lifetime(&self, token_type: TokenType) -> Option<TimeDelta> {
        match token_type {
            TokenType::Access => {
                TimeDelta::try_minutes(self.config.access_token_expiration_minutes)
            }
            TokenType::Refresh => TimeDelta::try_days(self.config.refresh_token_expiration_days),
        }
    }

    fn generate(
        &self,
        token_type: TokenType,
        user_id: Uuid,
        email: &str,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = self
            .lifetime(token_type)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                JwtError::EncodingError(format!("{} token expiry overflow", token_type))
            })?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.keys(token_type).encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Generate an access token signed with the access secret
    pub fn generate_access_token(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.generate(TokenType::Access, user_id, email)
    }

    /// Generate a refresh token signed with the refresh secret
    pub fn generate_refresh_token(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.generate(TokenType::Refresh, user_id, email)
    }

    fn validate(&self, token_type: TokenType, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        // Set leeway to 0 for strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.keys(token_type).decoding, &validation)?;
        let claims = token_data.claims;

        if claims.token_type != token_type {
            return Err(JwtError::InvalidTokenType);
        }

        Ok(claims)
    }

    /// Validate a token against the access secret
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(TokenType::Access, token)
    }

    /// Validate a token against the refresh secret
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(TokenType::Refresh, token)
    }
}
