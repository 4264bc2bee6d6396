//! Buganvillas admin console core.
//!
//! Client-side session handling for the condominium administration console:
//! persisting the session, talking to the backend's auth endpoints, renewing
//! expired access tokens and deciding which pages a navigation may reach.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod navigation;

pub use api::{AuthError, AuthGateway, ResourceClient};
pub use auth::{AuthProvider, SessionStore};
pub use config::Config;
pub use guard::{GuardDecision, RouteGuard};
pub use navigation::{NavigationIntent, Route};
