// handlers/home.rs - GET /home/

use axum::{extract::State, response::Response};

use super::respond;
use crate::app::AppState;
use crate::auth::require_authenticated;
use crate::error::AppError;
use crate::models::Account;
use crate::render::pages;
use crate::session::SiteSession;

/// Show the logged-in user's account. The account is re-read on every visit
/// and kept in the session for the other pages.
pub async fn get(State(state): State<AppState>, mut site: SiteSession) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_account_from_user_id(&mut site, user.id).await?;
    let (account, error) = if response.is_success() {
        (Some(response.parse::<Account>()?), None)
    } else {
        let message = response.message();
        tracing::warn!("No account for user {} ({}): {}", user.id, response.status, message);
        (None, Some(message))
    };

    site.set_account(account.clone());
    let messages = site.take_messages();
    let page = pages::home(&user, account.as_ref(), &messages, error.as_deref());
    respond(&mut site, page).await
}
