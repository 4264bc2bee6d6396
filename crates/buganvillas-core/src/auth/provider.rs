//! Reactive authentication state.
//!
//! `AuthProvider` projects the session store into an `AuthState` and
//! publishes it on a watch channel. The state changes on initialization,
//! login, logout, an explicit `refresh_user`, and whenever the store is
//! cleared underneath it (a failed token refresh, a refused login).

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::session::SessionHealth;
use crate::api::{AuthError, AuthGateway};
use crate::models::{AuthUser, Credentials};
use crate::navigation::{NavigationIntent, Route};

#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub is_loading: bool,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// What a protected view should do with this state
    pub fn view_gate(&self) -> ViewGate {
        if self.is_loading {
            ViewGate::Pending
        } else if self.is_authenticated() {
            ViewGate::Render
        } else {
            ViewGate::RedirectTo(Route::Login)
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }
}

/// Decision for a protected view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewGate {
    /// Session not resolved yet; render nothing conclusive
    Pending,
    Render,
    RedirectTo(Route),
}

pub struct AuthProvider {
    gateway: Arc<AuthGateway>,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthProvider {
    /// Build the provider and resolve the initial state from the store
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let state = Arc::new(state);

        let weak = Arc::downgrade(&state);
        gateway.store().on_clear(move || {
            if let Some(state) = weak.upgrade() {
                if state.send_if_modified(|s| s.user.take().is_some()) {
                    debug!("Session cleared, auth state now anonymous");
                }
            }
        });

        let provider = Self { gateway, state };
        provider.initialize();
        provider
    }

    fn initialize(&self) {
        let store = self.gateway.store();
        let user = match store.inspect() {
            SessionHealth::Active(user) => Some(user),
            SessionHealth::Absent => None,
            SessionHealth::Corrupted => {
                warn!("Discarding corrupted session");
                store.clear();
                None
            }
        };
        debug!(authenticated = user.is_some(), "Auth state initialized");
        self.publish(user, false);
    }

    fn publish(&self, user: Option<AuthUser>, is_loading: bool) {
        self.state.send_replace(AuthState { user, is_loading });
    }

    fn set_loading(&self) {
        self.state.send_modify(|state| state.is_loading = true);
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    /// Log in; the error is handed back for the login form to display
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
        self.set_loading();
        match self.gateway.login(credentials).await {
            Ok(auth) => {
                self.publish(Some(auth.user.clone()), false);
                Ok(auth.user)
            }
            Err(e) => {
                debug!(error = %e, "Login failed");
                self.publish(self.gateway.store().current_user(), false);
                Err(e)
            }
        }
    }

    /// Log out. Never fails; server-side problems are already absorbed by
    /// the gateway.
    pub async fn logout(&self) -> NavigationIntent {
        self.set_loading();
        let navigation = self.gateway.logout().await;
        self.publish(None, false);
        navigation
    }

    /// Re-read the cached user record from the store
    pub fn refresh_user(&self) {
        let user = self.gateway.store().current_user();
        let is_loading = self.state.borrow().is_loading;
        self.publish(user, is_loading);
    }
}
