//! Authentication module for local-auth
//!
//! This module provides authentication functionality including:
//! - Argon2 hashing of passwords and refresh tokens
//! - JWT access/refresh token generation and validation
//! - Local signup and signin, logout, and refresh-token rotation
//! - Bearer-token guards and REST API endpoints

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenType};
pub use middleware::{CurrentUser, RefreshPrincipal};
pub use password::{PasswordError, PasswordHasher};
pub use service::{AuthDto, AuthError, AuthService, Tokens};
