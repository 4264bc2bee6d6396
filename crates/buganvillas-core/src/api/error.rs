use thiserror::Error;

use crate::navigation::{NavigationIntent, Route};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

/// Failure to get any response at all
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_builder() {
            TransportError::Request(e.to_string())
        } else {
            TransportError::Connect(e.to_string())
        }
    }
}

/// Message shown when the backend cannot be reached
pub const UNREACHABLE_MESSAGE: &str = "No se puede conectar con el servidor";

/// Fallback when a failed login carries no recognizable message
pub const LOGIN_FAILED_MESSAGE: &str = "Error al iniciar sesión";

/// Fallback for a forbidden login without an `error` field
pub const ACCESS_DENIED_MESSAGE: &str = "Acceso denegado";

/// Normalized failure of login, logout, refresh or an authenticated call.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad email/password or a validation failure
    #[error("{0}")]
    Credentials(String),

    /// Authenticated principal lacks the administrator role
    #[error("{0}")]
    Forbidden(String),

    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable,

    /// Access token rejected and could not be renewed; the session is gone
    #[error("Session expired")]
    SessionExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Where the UI should go after this failure
    pub fn navigation(&self) -> NavigationIntent {
        match self {
            AuthError::Forbidden(_) => NavigationIntent::RedirectTo(Route::AccessDenied),
            AuthError::SessionExpired | AuthError::NotAuthenticated => {
                NavigationIntent::RedirectTo(Route::Login)
            }
            AuthError::Credentials(_) | AuthError::Unreachable | AuthError::Api(_) => {
                NavigationIntent::Stay
            }
        }
    }

    /// Text suitable for an inline form error
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// The error shapes the backend is known to emit. The first present
/// field wins, in declaration order.
#[derive(Debug, Default)]
pub(crate) struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    non_field_errors: Option<Vec<String>>,
    detail: Option<String>,
}

impl ErrorBody {
    /// Parse an error body; `None` when it is not a JSON object
    pub(crate) fn parse(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        if !value.is_object() {
            return None;
        }
        // Fields of an unexpected type are treated as absent rather than
        // failing the whole body
        Some(Self {
            error: string_field(&value, "error"),
            message: string_field(&value, "message"),
            non_field_errors: value
                .get("non_field_errors")
                .and_then(|v| v.as_array())
                .map(|list| {
                    list.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                }),
            detail: string_field(&value, "detail"),
        })
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn first_message(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| {
                self.non_field_errors
                    .as_ref()
                    .and_then(|list| list.first().cloned())
            })
            .or_else(|| self.detail.clone())
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}
