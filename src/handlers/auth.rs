// handlers/auth.rs - index, login and logout pages

use axum::{extract::State, response::Response, Form};

use super::{paths, redirect_to, respond};
use crate::app::AppState;
use crate::auth::redirect_if_authenticated;
use crate::error::AppError;
use crate::models::{GetUserPayload, LoginForm, UserRecord};
use crate::render::pages;
use crate::session::SiteSession;

/// GET / - straight to the home page (which gates itself)
pub async fn index() -> Response {
    redirect_to(paths::HOME)
}

/// GET /login/
pub async fn login_get(mut site: SiteSession) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&site) {
        return Ok(redirect);
    }

    let messages = site.take_messages();
    let page = pages::sign_in(site.saved_username(), None, &messages);
    respond(&mut site, page).await
}

/// POST /login/ - verify the credentials against `get_user`
pub async fn login_post(
    State(state): State<AppState>,
    mut site: SiteSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&site) {
        return Ok(redirect);
    }

    site.set_saved_username(form.username.as_str());

    let payload = GetUserPayload {
        username: &form.username,
        email: &form.email,
        password: &form.password,
    };
    let response = state.backend.get_user(&mut site, &payload).await?;

    if response.is_success() {
        let user: UserRecord = response.parse()?;
        tracing::info!("User {} logged in", user.id);
        site.set_user(user);
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    let message = response.message();
    tracing::warn!(
        "Login for '{}' rejected ({}): {}",
        form.username,
        response.status,
        message
    );
    let page = pages::sign_in(site.saved_username(), Some(&message), &[]);
    respond(&mut site, page).await
}

/// GET|POST /logout/ - drop the whole session
pub async fn logout(mut site: SiteSession) -> Result<Response, AppError> {
    if let Some(user) = site.user() {
        tracing::info!("User {} logged out", user.id);
    }
    site.flush().await?;
    Ok(redirect_to(paths::LOGIN))
}
