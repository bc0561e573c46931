//! Bearer-token guards for protected routes
//!
//! Each guard authenticates the request and stores a typed principal in the
//! request extensions. Handlers take it with `Extension<T>`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use uuid::Uuid;

use crate::core::auth::api::AuthApiState;
use crate::core::auth::jwt::{Claims, JwtError};
use crate::core::auth::service::AuthError;

/// Identity carried by a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
        })
    }
}

/// Identity carried by a valid refresh token, plus the raw token for rotation checks
#[derive(Clone)]
pub struct RefreshPrincipal {
    pub user: CurrentUser,
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshPrincipal")
            .field("user", &self.user)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
        tracing::warn!("Missing or malformed Authorization header");
        return Err(AuthError::Unauthorized);
    };

    let token = bearer.token();
    if token.is_empty() {
        return Err(AuthError::Unauthorized);
    }

    Ok(token.to_string())
}

fn reject(err: JwtError) -> AuthError {
    tracing::warn!(error = %err, "Bearer token rejected");
    err.into()
}

/// Require a valid access token; attaches [`CurrentUser`]
pub async fn require_access_token(
    State(state): State<Arc<AuthApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer_token(request.headers())?;

    let user = state
        .auth_service
        .jwt()
        .validate_access_token(&token)
        .and_then(CurrentUser::try_from)
        .map_err(reject)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Require a valid refresh token; attaches [`RefreshPrincipal`]
pub async fn require_refresh_token(
    State(state): State<Arc<AuthApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let refresh_token = extract_bearer_token(request.headers())?;

    let user = state
        .auth_service
        .jwt()
        .validate_refresh_token(&refresh_token)
        .and_then(CurrentUser::try_from)
        .map_err(reject)?;

    request.extensions_mut().insert(RefreshPrincipal {
        user,
        refresh_token,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::TokenType;
    use axum::http::{HeaderValue, header};

    #[test]
    fn test_extract_bearer_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer my_token_123"),
        );

        let token = extract_bearer_token(&headers).unwrap();
        assert_eq!(token, "my_token_123");
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let headers = HeaderMap::new();

        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_extract_bearer_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic base64credentials"),
        );

        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_extract_bearer_token_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));

        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn test_current_user_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            email: "a@x.com".to_string(),
            token_type: TokenType::Access,
            iat: 0,
            exp: 0,
            iss: "local-auth".to_string(),
            jti: "jti".to_string(),
        };

        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "a@x.com");
    }

    #[test]
    fn test_refresh_principal_debug_redacts_token() {
        let principal = RefreshPrincipal {
            user: CurrentUser {
                user_id: Uuid::new_v4(),
                email: "a@x.com".to_string(),
            },
            refresh_token: "secret.refresh.token".to_string(),
        };

        let debug = format!("{:?}", principal);
        assert!(!debug.contains("secret.refresh.token"));
    }
}
