//! local-auth - Local Credential Authentication Service
//!
//! Email/password signup and signin with Argon2-hashed credentials,
//! short-lived JWT access tokens, and rotating refresh tokens, served over axum.

pub mod core;
