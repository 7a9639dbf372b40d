// handlers/mod.rs - Page handlers
//
// Every page takes the shared `AppState` and the visitor's `SiteSession`,
// runs the gate, talks to the family API and answers with HTML or a redirect.
// Session changes are committed before the response leaves the handler.

pub mod account;
pub mod auth;
pub mod health;
pub mod home;
pub mod members;
pub mod sign_up;

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::client::ApiResponse;
use crate::error::AppError;
use crate::session::{Level, SiteSession};

/// Site URLs. Route patterns live in `app::router`.
pub mod paths {
    pub const INDEX: &str = "/";
    pub const LOGIN: &str = "/login/";
    pub const SIGN_UP: &str = "/sign_up/";
    pub const LOGOUT: &str = "/logout/";
    pub const HOME: &str = "/home/";
    pub const MEMBERS: &str = "/members/";
    pub const HEALTH: &str = "/health";

    pub fn account_update(id: i64) -> String {
        format!("/account/update/{}/", id)
    }

    pub fn member_update(id: i64) -> String {
        format!("/members/update/{}/", id)
    }

    pub fn member_delete(id: i64) -> String {
        format!("/members/delete/{}/", id)
    }
}

/// `302 Found` to `path`.
pub fn redirect_to(path: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, path)]).into_response()
}

/// Persist session changes, then answer.
pub(crate) async fn respond(
    site: &mut SiteSession,
    response: impl IntoResponse,
) -> Result<Response, AppError> {
    site.commit().await?;
    Ok(response.into_response())
}

/// Unpack the record an update/delete page works on. A rejected lookup is
/// flashed and `None` is returned; the caller then redirects home.
pub(crate) fn prefetched<T: DeserializeOwned>(
    site: &mut SiteSession,
    response: &ApiResponse,
) -> Result<Option<T>, AppError> {
    if response.is_success() {
        return Ok(Some(response.parse()?));
    }

    let message = response.message();
    tracing::warn!("Prefetch rejected ({}): {}", response.status, message);
    site.push_message(Level::Error, message);
    Ok(None)
}
