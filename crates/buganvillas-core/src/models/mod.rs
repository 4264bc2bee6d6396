//! Data models for the Buganvillas admin backend.
//!
//! This module contains the shapes exchanged with the authentication
//! endpoints:
//!
//! - `AuthUser`: the administrator record cached at login time
//! - `Perfil`, `TipoUsuario`, `CondominioRef`: profile descriptors nested in the user
//! - `Credentials`, `AuthResponse`, `RefreshResponse`: login/refresh payloads

pub mod auth;
pub mod user;

pub use auth::{AuthResponse, Credentials, RefreshResponse};
pub use user::{AuthUser, CondominioRef, Perfil, TipoUsuario, ADMIN_ROLE};
