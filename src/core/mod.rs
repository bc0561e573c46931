//! Core domain: configuration, credential storage, and authentication

pub mod auth;
pub mod config;
pub mod db;
