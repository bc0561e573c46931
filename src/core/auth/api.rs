//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /auth/local/signup - Register and get tokens
//! - POST /auth/local/signin - Login and get tokens
//! - POST /auth/logout - Invalidate the refresh token (access token required)
//! - POST /auth/refresh - Rotate the token pair (refresh token required)
//! - GET /health - Credential store health check

use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::core::auth::middleware::{
    CurrentUser, RefreshPrincipal, require_access_token, require_refresh_token,
};
use crate::core::auth::{AuthDto, AuthError, AuthService, Tokens};

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "EMAIL_EXISTS"),
            AuthError::AccessDenied => (StatusCode::FORBIDDEN, "ACCESS_DENIED"),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match &self {
            AuthError::InternalError(detail) => {
                tracing::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    let public = Router::new()
        .route("/auth/local/signup", post(signup_handler))
        .route("/auth/local/signin", post(signin_handler))
        .route("/health", get(health_handler));

    let access = Router::new()
        .route("/auth/logout", post(logout_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token,
        ));

    let refresh = Router::new()
        .route("/auth/refresh", post(refresh_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_refresh_token,
        ));

    public.merge(access).merge(refresh).with_state(state)
}

/// Unwrap a JSON body, turning extractor rejections into validation errors
fn credentials(payload: Result<Json<AuthDto>, JsonRejection>) -> Result<AuthDto, AuthError> {
    let Json(dto) = payload.map_err(|rejection| AuthError::Validation(rejection.body_text()))?;
    dto.validate()?;
    Ok(dto)
}

/// POST /auth/local/signup
async fn signup_handler(
    State(state): State<Arc<AuthApiState>>,
    payload: Result<Json<AuthDto>, JsonRejection>,
) -> Result<(StatusCode, Json<Tokens>), AuthError> {
    let dto = credentials(payload)?;
    tracing::info!("Signup attempt for email: {}", dto.email);

    let tokens = state.auth_service.signup_local(dto).await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// POST /auth/local/signin
async fn signin_handler(
    State(state): State<Arc<AuthApiState>>,
    payload: Result<Json<AuthDto>, JsonRejection>,
) -> Result<Json<Tokens>, AuthError> {
    let dto = credentials(payload)?;
    tracing::info!("Signin attempt for email: {}", dto.email);

    let tokens = state.auth_service.signin_local(dto).await?;

    Ok(Json(tokens))
}

/// POST /auth/logout
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode, AuthError> {
    tracing::info!("Logout request for email: {}", user.email);

    state.auth_service.logout(user.user_id).await?;

    Ok(StatusCode::OK)
}

/// POST /auth/refresh
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    Extension(principal): Extension<RefreshPrincipal>,
) -> Result<Json<Tokens>, AuthError> {
    tracing::debug!(user_id = %principal.user.user_id, "Token refresh request");

    let tokens = state
        .auth_service
        .refresh_tokens(principal.user.user_id, &principal.refresh_token)
        .await?;

    Ok(Json(tokens))
}

/// GET /health
async fn health_handler(State(state): State<Arc<AuthApiState>>) -> Response {
    match state.auth_service.health_check().await {
        Ok(()) => Json(HealthResponse { status: "ok" }).into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_status_codes() {
        let cases = [
            (
                AuthError::Validation("email should not be empty".to_string()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                AuthError::EmailAlreadyExists,
                StatusCode::CONFLICT,
                "EMAIL_EXISTS",
            ),
            (
                AuthError::AccessDenied,
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
            ),
            (
                AuthError::Unauthorized,
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
        ];

        for (error, status, code) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await["code"], code);
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response =
            AuthError::InternalError("connection refused at 10.0.0.5".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_access_denied_body() {
        let body = body_json(AuthError::AccessDenied.into_response()).await;

        assert_eq!(body["error"], "Access denied");
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("Something went wrong", "ERROR_CODE");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains("Something went wrong"));
        assert!(json.contains("ERROR_CODE"));
    }
}
