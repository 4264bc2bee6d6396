//! Auth gateway for the Buganvillas backend.
//!
//! `AuthGateway` owns every network call that creates, renews or destroys a
//! session, and wraps resource calls with bearer attachment plus a single
//! refresh-and-retry on 401.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{ErrorBody, ACCESS_DENIED_MESSAGE, LOGIN_FAILED_MESSAGE};
use super::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use super::{AuthError, TransportError};
use crate::auth::SessionStore;
use crate::config::Config;
use crate::models::{AuthResponse, Credentials, RefreshResponse};
use crate::navigation::{NavigationIntent, Route};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint reserved for the web console (administrators only)
const LOGIN_PATH: &str = "/api/auth/web/login/";

const LOGOUT_PATH: &str = "/api/auth/logout/";

const REFRESH_PATH: &str = "/api/token/refresh/";

/// Default bound for login and refresh round trips
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 15;

/// Result of trying to renew the access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Renewed(String),
    /// Renewal was impossible; the session has been torn down
    LoggedOut(NavigationIntent),
}

pub struct AuthGateway {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    base_url: String,
    auth_timeout: Duration,
    require_admin_role: bool,
    /// Serializes refreshes so concurrent 401s share one renewal
    refresh_lock: Mutex<()>,
}

impl AuthGateway {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<SessionStore>, base_url: &str) -> Self {
        Self {
            transport,
            store,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
            require_admin_role: false,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Gateway over a real HTTP client configured from `config`
    pub fn from_config(config: &Config, store: Arc<SessionStore>) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), store, config.base_url())
            .with_auth_timeout(config.auth_timeout())
            .with_admin_role_check(config.require_admin_role))
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn with_admin_role_check(mut self, enabled: bool) -> Self {
        self.require_admin_role = enabled;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Absolute URL for a backend path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send with the auth timeout applied; a timeout is a transport failure
    async fn send_bounded(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        match tokio::time::timeout(self.auth_timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    // ===== Login =====

    /// Authenticate against the web login endpoint and persist the session
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        let request = ApiRequest::post(self.url(LOGIN_PATH))
            .json(credentials)
            .map_err(|e| AuthError::Credentials(e.to_string()))?;

        let response = match self.send_bounded(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return Err(AuthError::Unreachable);
            }
        };

        if response.status == 403 {
            // A rejected login must not leave any session behind
            self.store.clear();
            let message = ErrorBody::parse(&response.body)
                .and_then(|body| body.error().map(str::to_string))
                .unwrap_or_else(|| ACCESS_DENIED_MESSAGE.to_string());
            warn!("Login forbidden for this console");
            return Err(AuthError::Forbidden(message));
        }

        if !response.is_success() {
            let message = match ErrorBody::parse(&response.body) {
                Some(body) => body
                    .first_message()
                    .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()),
                None => format!("Error del servidor ({})", response.status),
            };
            debug!(status = response.status, "Login rejected");
            return Err(AuthError::Credentials(message));
        }

        let auth: AuthResponse = response.json()?;

        if self.require_admin_role && !auth.user.is_administrator() {
            warn!(user_id = auth.user.id, role = ?auth.user.role(), "Non-administrator login refused");
            // The server already issued tokens; revoke them before dropping
            self.notify_logout(&auth.refresh_token, Some(&auth.access_token))
                .await;
            self.store.clear();
            return Err(AuthError::Forbidden(ACCESS_DENIED_MESSAGE.to_string()));
        }

        self.store.save(&auth);
        info!(user_id = auth.user.id, "Logged in");
        Ok(auth)
    }

    // ===== Logout =====

    /// Invalidate the refresh token server-side if possible, then always
    /// clear the local session
    pub async fn logout(&self) -> NavigationIntent {
        if let Some(refresh_token) = self.store.refresh_token() {
            let access_token = self.store.access_token();
            self.notify_logout(&refresh_token, access_token.as_deref())
                .await;
        }

        self.store.clear();
        info!("Logged out");
        NavigationIntent::RedirectTo(Route::Login)
    }

    /// Best-effort server-side invalidation of `refresh_token`
    async fn notify_logout(&self, refresh_token: &str, access_token: Option<&str>) {
        let mut request = ApiRequest::post(self.url(LOGOUT_PATH))
            .with_body(json!({ "refresh_token": refresh_token }));
        if let Some(access_token) = access_token {
            request = request.bearer(access_token);
        }

        match self.send_bounded(request).await {
            Ok(response) if response.is_success() => debug!("Refresh token invalidated"),
            Ok(response) => {
                warn!(status = response.status, "Server refused logout, clearing locally")
            }
            Err(e) => warn!(error = %e, "Server logout failed, clearing locally"),
        }
    }

    // ===== Refresh =====

    /// Exchange the refresh token for a new access token. Any failure
    /// logs the user out completely.
    pub async fn refresh_access_token(&self) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.store.refresh_token() else {
            warn!("No refresh token available");
            return RefreshOutcome::LoggedOut(self.logout().await);
        };

        let request =
            ApiRequest::post(self.url(REFRESH_PATH)).with_body(json!({ "refresh": refresh_token }));

        let renewed = match self.send_bounded(request).await {
            Ok(response) if response.is_success() => match response.json::<RefreshResponse>() {
                Ok(body) if !body.access.is_empty() => Some(body.access),
                Ok(_) => {
                    warn!("Refresh response carried an empty token");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Malformed refresh response");
                    None
                }
            },
            Ok(response) => {
                warn!(status = response.status, "Token refresh rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                None
            }
        };

        match renewed {
            Some(token) if self.store.replace_access_token(&token) => {
                debug!("Access token renewed");
                RefreshOutcome::Renewed(token)
            }
            _ => RefreshOutcome::LoggedOut(self.logout().await),
        }
    }

    /// Refresh after `rejected` got a 401, unless a concurrent caller
    /// already replaced it
    async fn renew_after_rejection(&self, rejected: &str) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;
        match self.store.access_token() {
            Some(current) if current != rejected => {
                debug!("Access token already renewed by a concurrent request");
                RefreshOutcome::Renewed(current)
            }
            Some(_) => self.refresh_locked().await,
            // A concurrent failed refresh already logged out
            None => RefreshOutcome::LoggedOut(NavigationIntent::RedirectTo(Route::Login)),
        }
    }

    // ===== Authenticated requests =====

    /// Send `request` with the current bearer token. On 401 the token is
    /// refreshed once and the request retried once; the retry's response
    /// is returned whatever its status.
    pub async fn authenticated_fetch(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let Some(token) = self.store.access_token() else {
            return Err(AuthError::NotAuthenticated);
        };

        let response = self.send_with_token(request.clone(), &token).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        debug!(url = %request.url, "Access token rejected, refreshing");
        let token = match self.renew_after_rejection(&token).await {
            RefreshOutcome::Renewed(token) => token,
            RefreshOutcome::LoggedOut(_) => return Err(AuthError::SessionExpired),
        };

        self.send_with_token(request, &token).await
    }

    async fn send_with_token(
        &self,
        request: ApiRequest,
        token: &str,
    ) -> Result<ApiResponse, AuthError> {
        let url = request.url.clone();
        self.transport
            .send(request.bearer(token))
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request failed");
                AuthError::Unreachable
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockTransport;
    use crate::models::user::fixtures::admin_user;

    const BASE: &str = "http://backend.test";

    fn login_ok() -> ApiResponse {
        ApiResponse::json_body(
            200,
            &json!({
                "access_token": "A",
                "refresh_token": "R",
                "user": serde_json::to_value(admin_user(1)).unwrap(),
                "message": "Inicio de sesión exitoso"
            }),
        )
    }

    fn gateway(transport: Arc<MockTransport>) -> AuthGateway {
        AuthGateway::new(transport, Arc::new(SessionStore::memory()), BASE)
    }

    fn seeded(transport: Arc<MockTransport>, access: &str, refresh: &str) -> AuthGateway {
        let gateway = gateway(transport);
        gateway.store().save(&AuthResponse {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            user: admin_user(1),
            message: None,
        });
        gateway
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let transport = MockTransport::new(|_| Ok(login_ok()));
        let gateway = gateway(transport.clone());

        let auth = gateway
            .login(&Credentials::new("admin@buganvillas.bo", "secret"))
            .await
            .expect("login should succeed");

        assert_eq!(auth.user.id, 1);
        assert!(gateway.store().is_authenticated());
        assert_eq!(gateway.store().access_token().as_deref(), Some("A"));
        assert_eq!(gateway.store().refresh_token().as_deref(), Some("R"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://backend.test/api/auth/web/login/");
        assert_eq!(
            calls[0].body,
            Some(json!({"email": "admin@buganvillas.bo", "password": "secret"}))
        );
        assert!(calls[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_login_forbidden_leaves_no_session() {
        let transport = MockTransport::new(|_| {
            Ok(ApiResponse::json_body(403, &json!({"error": "forbidden"})))
        });
        let gateway = seeded(transport, "OLD", "OLDR");

        let err = gateway
            .login(&Credentials::new("residente@buganvillas.bo", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Forbidden(ref m) if m == "forbidden"));
        assert_eq!(err.navigation(), NavigationIntent::RedirectTo(Route::AccessDenied));
        assert!(!gateway.store().is_authenticated());
        assert!(gateway.store().cookie_header().is_none());
    }

    #[tokio::test]
    async fn test_login_forbidden_without_body_uses_default_message() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(403, "")));
        let err = gateway(transport)
            .login(&Credentials::new("a@b.c", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), ACCESS_DENIED_MESSAGE);
    }

    #[tokio::test]
    async fn test_login_error_shapes() {
        let cases = [
            (json!({"error": "Credenciales inválidas"}), "Credenciales inválidas"),
            (json!({"message": "Usuario inactivo"}), "Usuario inactivo"),
            (json!({"non_field_errors": ["Email o contraseña incorrectos"]}), "Email o contraseña incorrectos"),
            (json!({"detail": "No active account"}), "No active account"),
            (json!({"email": ["Este campo es requerido."]}), LOGIN_FAILED_MESSAGE),
        ];

        for (body, expected) in cases {
            let transport = MockTransport::new(move |_| Ok(ApiResponse::json_body(400, &body)));
            let gateway = gateway(transport);
            let err = gateway.login(&Credentials::new("a@b.c", "x")).await.unwrap_err();

            assert!(matches!(err, AuthError::Credentials(_)));
            assert_eq!(err.user_message(), expected);
            assert_eq!(err.navigation(), NavigationIntent::Stay);
            assert!(!gateway.store().is_authenticated());
        }
    }

    #[tokio::test]
    async fn test_login_unparseable_error_body() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(502, "<html>Bad Gateway</html>")));
        let err = gateway(transport)
            .login(&Credentials::new("a@b.c", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Error del servidor (502)");
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let transport =
            MockTransport::new(|_| Err(TransportError::Connect("connection refused".into())));
        let err = gateway(transport)
            .login(&Credentials::new("a@b.c", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unreachable));
        assert_eq!(err.user_message(), "No se puede conectar con el servidor");
    }

    #[tokio::test]
    async fn test_login_timeout_is_unreachable() {
        let transport = MockTransport::new(|_| Ok(login_ok()))
            .with_delay(LOGIN_PATH, Duration::from_millis(500));
        let gateway = gateway(transport).with_auth_timeout(Duration::from_millis(20));

        let err = gateway.login(&Credentials::new("a@b.c", "x")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unreachable));
        assert!(!gateway.store().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_admin_role_check() {
        let transport = MockTransport::new(|_| {
            let mut user = admin_user(7);
            if let Some(ref mut perfil) = user.perfil {
                perfil.tipo_usuario.tipo = "PROPIETARIO".to_string();
            }
            Ok(ApiResponse::json_body(
                200,
                &json!({"access_token": "A", "refresh_token": "R", "user": user}),
            ))
        });
        let gateway = gateway(transport.clone()).with_admin_role_check(true);

        let err = gateway.login(&Credentials::new("a@b.c", "x")).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
        assert!(!gateway.store().is_authenticated());

        // The freshly issued refresh token is revoked server-side
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].url.ends_with(LOGOUT_PATH));
        assert_eq!(calls[1].bearer.as_deref(), Some("A"));
        assert_eq!(calls[1].body, Some(json!({"refresh_token": "R"})));
    }

    #[tokio::test]
    async fn test_logout_notifies_server_and_clears() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(200, "{}")));
        let gateway = seeded(transport.clone(), "A", "R");

        let nav = gateway.logout().await;

        assert_eq!(nav, NavigationIntent::RedirectTo(Route::Login));
        assert!(!gateway.store().is_authenticated());
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].url.ends_with(LOGOUT_PATH));
        assert_eq!(calls[0].bearer.as_deref(), Some("A"));
        assert_eq!(calls[0].body, Some(json!({"refresh_token": "R"})));
    }

    #[tokio::test]
    async fn test_logout_survives_server_failure() {
        let transport = MockTransport::new(|_| Err(TransportError::Connect("down".into())));
        let gateway = seeded(transport, "A", "R");

        let nav = gateway.logout().await;

        assert_eq!(nav, NavigationIntent::RedirectTo(Route::Login));
        assert!(!gateway.store().is_authenticated());
        assert!(gateway.store().access_token().is_none());
    }

    #[tokio::test]
    async fn test_logout_without_session_skips_server() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(200, "")));
        let gateway = gateway(transport.clone());
        gateway.logout().await;
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_access_token() {
        let transport = MockTransport::new(|req| {
            assert_eq!(req.body, Some(json!({"refresh": "R"})));
            Ok(ApiResponse::json_body(200, &json!({"access": "A2"})))
        });
        let gateway = seeded(transport, "A", "R");

        assert_eq!(gateway.refresh_access_token().await, RefreshOutcome::Renewed("A2".into()));
        assert_eq!(gateway.store().access_token().as_deref(), Some("A2"));
        assert_eq!(gateway.store().refresh_token().as_deref(), Some("R"));
    }

    #[tokio::test]
    async fn test_refresh_failure_logs_out() {
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(REFRESH_PATH) {
                Ok(ApiResponse::json_body(401, &json!({"detail": "Token is invalid or expired"})))
            } else {
                Ok(ApiResponse::new(200, ""))
            }
        });
        let gateway = seeded(transport.clone(), "A", "R");

        let outcome = gateway.refresh_access_token().await;

        assert_eq!(outcome, RefreshOutcome::LoggedOut(NavigationIntent::RedirectTo(Route::Login)));
        assert!(!gateway.store().is_authenticated());
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn test_refresh_timeout_logs_out() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::json_body(200, &json!({"access": "A2"}))))
            .with_delay(REFRESH_PATH, Duration::from_millis(500));
        let gateway = seeded(transport.clone(), "A", "R").with_auth_timeout(Duration::from_millis(20));

        let outcome = gateway.refresh_access_token().await;

        assert_eq!(outcome, RefreshOutcome::LoggedOut(NavigationIntent::RedirectTo(Route::Login)));
        assert!(!gateway.store().is_authenticated());
        assert!(gateway.store().cookie_header().is_none());
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(transport.calls_to(LOGOUT_PATH), 1);
    }

    #[tokio::test]
    async fn test_refresh_malformed_body_logs_out() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::json_body(200, &json!({"token": "x"}))));
        let gateway = seeded(transport, "A", "R");
        assert!(matches!(gateway.refresh_access_token().await, RefreshOutcome::LoggedOut(_)));
        assert!(!gateway.store().is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_logs_out() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(200, "")));
        let gateway = gateway(transport.clone());
        assert!(matches!(gateway.refresh_access_token().await, RefreshOutcome::LoggedOut(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_passes_through_non_401() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(404, "missing")));
        let gateway = seeded(transport.clone(), "A", "R");

        let response = gateway
            .authenticated_fetch(ApiRequest::get(gateway.url("/api/unidades/99/")))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].bearer.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_fetch_refreshes_and_retries_once() {
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(REFRESH_PATH) {
                return Ok(ApiResponse::json_body(200, &json!({"access": "A2"})));
            }
            match req.bearer.as_deref() {
                Some("A2") => Ok(ApiResponse::json_body(200, &json!([{"id": 1}]))),
                _ => Ok(ApiResponse::new(401, "")),
            }
        });
        let gateway = seeded(transport.clone(), "A", "R");

        let response = gateway
            .authenticated_fetch(ApiRequest::get(gateway.url("/api/camaras/")))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"[{"id":1}]"#);
        assert_eq!(transport.calls_to("/api/camaras/"), 2);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        let retry = transport
            .calls()
            .into_iter()
            .filter(|c| c.url.ends_with("/api/camaras/"))
            .last()
            .unwrap();
        assert_eq!(retry.bearer.as_deref(), Some("A2"));
    }

    #[tokio::test]
    async fn test_fetch_refresh_failure_clears_session() {
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(REFRESH_PATH) {
                Ok(ApiResponse::new(401, ""))
            } else if req.url.ends_with(LOGOUT_PATH) {
                Ok(ApiResponse::new(200, ""))
            } else {
                Ok(ApiResponse::new(401, ""))
            }
        });
        let gateway = seeded(transport.clone(), "A", "R");

        let err = gateway
            .authenticated_fetch(ApiRequest::get(gateway.url("/api/alertas/")))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::SessionExpired));
        assert_eq!(err.navigation(), NavigationIntent::RedirectTo(Route::Login));
        assert!(!gateway.store().is_authenticated());
        assert_eq!(transport.calls_to("/api/alertas/"), 1);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert!(transport.calls().len() <= 3);
    }

    #[tokio::test]
    async fn test_fetch_does_not_loop_on_persistent_401() {
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(REFRESH_PATH) {
                Ok(ApiResponse::json_body(200, &json!({"access": "A2"})))
            } else {
                Ok(ApiResponse::new(401, ""))
            }
        });
        let gateway = seeded(transport.clone(), "A", "R");

        let response = gateway
            .authenticated_fetch(ApiRequest::get(gateway.url("/api/cuotas/")))
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(transport.calls_to("/api/cuotas/"), 2);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn test_fetch_without_session() {
        let transport = MockTransport::new(|_| Ok(ApiResponse::new(200, "")));
        let gateway = gateway(transport.clone());
        let err = gateway
            .authenticated_fetch(ApiRequest::get(gateway.url("/api/usuarios/")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(REFRESH_PATH) {
                return Ok(ApiResponse::json_body(200, &json!({"access": "A2"})));
            }
            match req.bearer.as_deref() {
                Some("A2") => Ok(ApiResponse::new(200, "ok")),
                _ => Ok(ApiResponse::new(401, "")),
            }
        })
        .with_delay(REFRESH_PATH, Duration::from_millis(50));
        let gateway = seeded(transport.clone(), "A", "R");

        let (first, second) = futures::join!(
            gateway.authenticated_fetch(ApiRequest::get(gateway.url("/api/unidades/"))),
            gateway.authenticated_fetch(ApiRequest::get(gateway.url("/api/areas-comunes/"))),
        );

        assert_eq!(first.unwrap().status, 200);
        assert_eq!(second.unwrap().status, 200);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(gateway.store().access_token().as_deref(), Some("A2"));
    }
}
