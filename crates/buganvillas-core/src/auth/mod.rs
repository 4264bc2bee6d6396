//! Authentication module for managing the administrator session.
//!
//! This module provides:
//! - `SessionStore`: persisted tokens and user record, plus the cookie mirror
//!   the route guard reads
//! - `AuthProvider`: the reactive `AuthState` views render from
//!
//! Access tokens are mirrored into the cookie jar for 24 hours.

pub mod cookie;
pub mod provider;
pub mod session;

pub use provider::{AuthProvider, AuthState, ViewGate};
pub use session::{
    FileBackend, MemoryBackend, SessionBackend, SessionData, SessionHealth, SessionStore, Slot,
};
