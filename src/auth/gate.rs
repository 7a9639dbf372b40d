use axum::response::Response;

use crate::handlers::{paths, redirect_to};
use crate::models::UserRecord;
use crate::session::SiteSession;

/// Pages behind login: hand back the session user or a redirect to `/login/`.
pub fn require_authenticated(session: &SiteSession) -> Result<UserRecord, Response> {
    match session.user() {
        Some(user) => Ok(user.clone()),
        None => {
            tracing::debug!("No user in session, redirecting to login");
            Err(redirect_to(paths::LOGIN))
        }
    }
}

/// Login and sign-up: a logged-in visitor is sent home instead.
pub fn redirect_if_authenticated(session: &SiteSession) -> Option<Response> {
    session.user().map(|_| redirect_to(paths::HOME))
}
