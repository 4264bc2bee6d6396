//! Cookie mirror of the access token.
//!
//! The route guard runs before any session state is loaded, so the access
//! token is also kept as a cookie line it can read on its own.

use chrono::{DateTime, Duration, Utc};

/// Cookie carrying the mirrored access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Mirror lifetime: 24 hours
pub const MIRROR_MAX_AGE_SECS: i64 = 86_400;

/// The mirror is only ever sent on same-site navigations
const SAME_SITE: &str = "Strict";

/// Cookie configuration
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub max_age_secs: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: ACCESS_TOKEN_COOKIE.to_string(),
            path: "/".to_string(),
            max_age_secs: MIRROR_MAX_AGE_SECS,
        }
    }
}

impl CookieConfig {
    /// Build a Set-Cookie line with an absolute expiry so it can be
    /// checked after being read back from the jar
    pub fn build_set_cookie(&self, value: &str, now: DateTime<Utc>) -> String {
        let expires = now + Duration::seconds(self.max_age_secs);
        format!(
            "{}={}; Path={}; Max-Age={}; SameSite={}; Expires={}",
            self.name,
            value,
            self.path,
            self.max_age_secs,
            SAME_SITE,
            expires.to_rfc2822()
        )
    }

    /// Build Set-Cookie line for deletion (expired)
    pub fn build_delete_cookie(&self) -> String {
        format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:01 +0000",
            self.name, self.path
        )
    }
}

/// A Set-Cookie line read back from the jar
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let mut expires = None;

        for attr in parts {
            let Some((key, val)) = attr.trim().split_once('=') else {
                continue;
            };
            if key.eq_ignore_ascii_case("expires") {
                expires = DateTime::parse_from_rfc2822(val.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
            } else if key.eq_ignore_ascii_case("max-age") && val.trim() == "0" {
                expires = Some(DateTime::<Utc>::MIN_UTC);
            }
        }

        Some(Self {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            expires,
        })
    }

    /// Live cookies have a value and an expiry in the future (or none)
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && self.expires.map(|e| e > now).unwrap_or(true)
    }
}

/// Extract a cookie value from a `Cookie:` request header
pub fn extract_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|cookie| {
        let (key, value) = cookie.trim().split_once('=')?;
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}
