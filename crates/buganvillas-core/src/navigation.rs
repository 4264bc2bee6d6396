//! Navigation intents returned by auth operations.
//!
//! Auth and session code never drives navigation itself; it hands back a
//! `NavigationIntent` and the UI layer decides how to act on it.

use std::fmt;

/// Well-known console destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    /// Authenticated landing page
    Dashboard,
    AccessDenied,
    Path(String),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::AccessDenied => "/access-denied",
            Route::Path(p) => p.as_str(),
        }
    }

    /// Map a path back to a well-known route when it names one
    pub fn from_path(path: &str) -> Self {
        match path {
            "/login" => Route::Login,
            "/dashboard" => Route::Dashboard,
            "/access-denied" => Route::AccessDenied,
            other => Route::Path(other.to_string()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    Stay,
    RedirectTo(Route),
}

impl NavigationIntent {
    pub fn redirect_target(&self) -> Option<&Route> {
        match self {
            NavigationIntent::Stay => None,
            NavigationIntent::RedirectTo(route) => Some(route),
        }
    }
}
