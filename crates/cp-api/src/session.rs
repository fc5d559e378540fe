//! Cookie-session glue: the host's per-request session plumbing.
//!
//! The core never sees the cookie machinery; it receives the
//! `SessionContext` value these helpers materialize per request.

use actix_session::Session;
use cp_core::error::AppError;
use cp_core::models::User;
use cp_core::SessionContext;

use crate::error::ApiError;

const IDENTITY_KEY: &str = "identity";

/// Builds the request's context. A missing or unreadable session entry
/// degrades to `Anonymous` rather than failing the request.
pub fn current(session: &Session) -> SessionContext {
    session
        .get::<SessionContext>(IDENTITY_KEY)
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Set exactly once, on successful credential verification.
pub fn establish(session: &Session, user: &User) -> Result<(), ApiError> {
    session
        .insert(IDENTITY_KEY, SessionContext::for_user(user))
        .map_err(|e| ApiError(AppError::Internal(format!("session write failed: {e}"))))
}

/// Full wipe, used by logout and self-account deletion.
pub fn clear(session: &Session) {
    session.purge();
}
