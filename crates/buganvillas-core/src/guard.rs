//! Coarse pre-render route protection.
//!
//! The guard only checks whether the access-token cookie is present. It
//! never validates the token; expired or revoked tokens are caught by the
//! backend and the gateway's refresh-and-retry path.

use serde::{Deserialize, Serialize};

use crate::auth::cookie::{extract_cookie, ACCESS_TOKEN_COOKIE};
use crate::navigation::Route;

/// Route sets consulted by the guard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Pages that require a session
    pub protected: Vec<String>,
    /// Pages only anonymous users should see
    pub auth_only: Vec<String>,
    /// Paths the guard never looks at (API calls, static assets)
    pub excluded: Vec<String>,
    pub landing: String,
    pub login: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        let owned = |paths: &[&str]| paths.iter().map(|p| p.to_string()).collect();
        Self {
            protected: owned(&[
                "/dashboard",
                "/profile",
                "/settings",
                "/notifications",
                "/areas",
                "/payments",
                "/reports",
                "/residents",
                "/finance",
                "/security",
                "/maintenance",
            ]),
            auth_only: owned(&["/login"]),
            excluded: owned(&["/api", "/_next/static", "/_next/image", "/favicon.ico"]),
            landing: Route::Dashboard.path().to_string(),
            login: Route::Login.path().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

pub struct RouteGuard {
    routes: RouteTable,
}

impl RouteGuard {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    /// Decide a navigation to `path` given the request's `Cookie:` header
    pub fn check(&self, path: &str, cookie_header: Option<&str>) -> GuardDecision {
        let path = normalize(path);
        if self.routes.excluded.iter().any(|p| matches_prefix(p, &path)) {
            return GuardDecision::Allow;
        }

        let has_token = cookie_header
            .and_then(|h| extract_cookie(h, ACCESS_TOKEN_COOKIE))
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);

        if path == "/" {
            return if has_token {
                self.redirect_to(&self.routes.landing)
            } else {
                self.redirect_to(&self.routes.login)
            };
        }

        if !has_token && self.routes.protected.iter().any(|p| matches_prefix(p, &path)) {
            return self.redirect_to(&self.routes.login);
        }

        if has_token && self.routes.auth_only.iter().any(|p| matches_prefix(p, &path)) {
            return self.redirect_to(&self.routes.landing);
        }

        GuardDecision::Allow
    }

    fn redirect_to(&self, path: &str) -> GuardDecision {
        GuardDecision::Redirect(Route::from_path(path))
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(RouteTable::default())
    }
}

/// Drop query/fragment and trailing slashes; always starts with `/`
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Segment-aware prefix match: `/areas` covers `/areas` and `/areas/3`,
/// not `/areasx`
fn matches_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
