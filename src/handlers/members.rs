// handlers/members.rs - add, update and delete family members
//
//   GET/POST /members/
//   GET/POST /members/update/:pk/
//   GET/POST /members/delete/:pk/

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};

use super::{paths, prefetched, redirect_to, respond};
use crate::app::AppState;
use crate::auth::require_authenticated;
use crate::error::AppError;
use crate::models::{Member, MemberForm, UserRecord};
use crate::render::pages;
use crate::session::{Level, SiteSession};

pub const SELF_DELETE: &str = "Cannot delete yourself as a member of the family";
pub const FOREIGN_MEMBER: &str = "You can only delete members of your own family.";

/// Why `user` may not delete `member`, if they may not.
///
/// The user's own member record is recognised by name (first and last name
/// concatenated). A member owned by a different user is refused as well.
pub fn deletion_refusal(user: &UserRecord, member: &Member) -> Option<&'static str> {
    if member.full_name() == user.full_name() {
        return Some(SELF_DELETE);
    }
    match member.user {
        Some(owner) if owner != user.id => Some(FOREIGN_MEMBER),
        _ => None,
    }
}

// Add

pub async fn add_get(mut site: SiteSession) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let page = pages::add_member(&user, &MemberForm::default(), None);
    respond(&mut site, page).await
}

pub async fn add_post(
    State(state): State<AppState>,
    mut site: SiteSession,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    if let Err(message) = form.validate() {
        return respond(&mut site, pages::add_member(&user, &form, Some(&message))).await;
    }

    let payload = form.clone().into_payload(user.id);
    let response = state.backend.create_member(&mut site, &payload).await?;

    if response.is_success() {
        tracing::info!("User {} added member {} {}", user.id, form.first_name, form.last_name);
        site.push_message(Level::Info, "Member added.");
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    let message = response.message();
    tracing::warn!("Add member rejected ({}): {}", response.status, message);
    respond(&mut site, pages::add_member(&user, &form, Some(&message))).await
}

// Update

pub async fn update_get(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    mut site: SiteSession,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_member(&mut site, pk).await?;
    let Some(member) = prefetched::<Member>(&mut site, &response)? else {
        return respond(&mut site, redirect_to(paths::HOME)).await;
    };

    let page = pages::update_member(&user, pk, &MemberForm::from(&member), None);
    respond(&mut site, page).await
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    mut site: SiteSession,
    Form(form): Form<MemberForm>,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_member(&mut site, pk).await?;
    if prefetched::<Member>(&mut site, &response)?.is_none() {
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    if let Err(message) = form.validate() {
        return respond(&mut site, pages::update_member(&user, pk, &form, Some(&message))).await;
    }

    let payload = form.clone().into_payload(user.id);
    let response = state.backend.update_member(&mut site, pk, &payload).await?;

    if response.is_success() {
        tracing::info!("User {} updated member {}", user.id, pk);
        site.push_message(Level::Info, "Member updated.");
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    let message = response.message();
    tracing::warn!("Member {} update rejected ({}): {}", pk, response.status, message);
    respond(&mut site, pages::update_member(&user, pk, &form, Some(&message))).await
}

// Delete

pub async fn delete_get(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    mut site: SiteSession,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_member(&mut site, pk).await?;
    let Some(member) = prefetched::<Member>(&mut site, &response)? else {
        return respond(&mut site, redirect_to(paths::HOME)).await;
    };

    let page = pages::delete_member(&user, pk, &member, None);
    respond(&mut site, page).await
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
    mut site: SiteSession,
) -> Result<Response, AppError> {
    let user = match require_authenticated(&site) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let response = state.backend.get_member(&mut site, pk).await?;
    let Some(member) = prefetched::<Member>(&mut site, &response)? else {
        return respond(&mut site, redirect_to(paths::HOME)).await;
    };

    if let Some(refusal) = deletion_refusal(&user, &member) {
        tracing::warn!("User {} refused deletion of member {}: {}", user.id, pk, refusal);
        let page = pages::delete_member(&user, pk, &member, Some(refusal));
        return respond(&mut site, page).await;
    }

    let response = state.backend.delete_member(&mut site, pk).await?;

    if response.is_success() {
        tracing::info!("User {} deleted member {}", user.id, pk);
        site.push_message(Level::Info, "Member deleted.");
        return respond(&mut site, redirect_to(paths::HOME)).await;
    }

    let message = response.message();
    tracing::warn!("Member {} deletion rejected ({}): {}", pk, response.status, message);
    let page = pages::delete_member(&user, pk, &member, Some(&message));
    respond(&mut site, page).await
}
