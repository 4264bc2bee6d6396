//! REST API client module for the Buganvillas backend.
//!
//! This module provides the `AuthGateway` that owns login, logout and token
//! refresh, the `ResourceClient` for the console's data endpoints, and the
//! `Transport` seam both of them send through.
//!
//! The backend uses JWT bearer authentication: a short-lived access token
//! plus a refresh token exchanged at `/api/token/refresh/`.

pub mod client;
pub mod error;
pub mod resources;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{AuthGateway, RefreshOutcome};
pub use error::{ApiError, AuthError, TransportError};
pub use resources::{Resource, ResourceClient};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Payload, Transport};
