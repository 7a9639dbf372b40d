// handlers/account.rs - GET/POST /account/update/:pk/

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};

use super::{paths, prefetched, redirect_to, respond};
use crate::app::AppState;
use crate::auth::require_authenticated;
use crate::error::AppError;
use crate::models::{Account, AccountForm, AccountUpdatePayload};
use crate::render::pages;
use crate::session::{Level, SiteSession};

pub async fn get(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    mut site: SiteSession,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_user_account(&mut site, pk).await?;
    let Some(account) = prefetched::<Account>(&mut site, &response)? else {
        return respond(&mut site, redirect_to(paths::HOME)).await;
    };

    let page = pages::update_account(&user, pk, &AccountForm::from(&account), None);
    respond(&mut site, page).await
}

pub async fn post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    mut site: SiteSession,
    Form(form): Form<AccountForm>,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_user_account(&mut site, pk).await?;
    if prefetched::<Account>(&mut site, &response)?.is_none() {
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    let payload = AccountUpdatePayload::from(form.clone());
    let response = state.backend.update_user_account(&mut site, pk, &payload).await?;

    if response.is_success() {
        tracing::info!("User {} updated account {}", user.id, pk);
        site.push_message(Level::Info, "Account updated.");
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    let message = response.message();
    tracing::warn!("Account {} update rejected ({}): {}", pk, response.status, message);
    let page = pages::update_account(&user, pk, &form, Some(&message));
    respond(&mut site, page).await
}
