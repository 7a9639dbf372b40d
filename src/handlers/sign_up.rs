// handlers/sign_up.rs - GET/POST /sign_up/
//
// Registration is three backend calls: create the user, create their account,
// create the user's own member record. A failure part-way undoes the earlier
// steps (best effort) so no half-registered user is left behind.

use axum::{extract::State, response::Response, Form};
use serde_json::Value;

use super::{paths, redirect_to, respond};
use crate::app::AppState;
use crate::auth::redirect_if_authenticated;
use crate::client::{ApiResponse, Backend};
use crate::error::AppError;
use crate::models::{
    CreateAccountPayload, CreateUserPayload, MemberForm, SavedSignUpForm, SignUpForm, UserRecord,
};
use crate::render::pages;
use crate::session::SiteSession;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";

pub async fn get(mut site: SiteSession) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&site) {
        return Ok(redirect);
    }

    let page = pages::sign_up(&site.saved_signup_form(), None);
    respond(&mut site, page).await
}

pub async fn post(
    State(state): State<AppState>,
    mut site: SiteSession,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&site) {
        return Ok(redirect);
    }

    let saved = SavedSignUpForm::from(&form);
    site.set_saved_signup_form(saved.clone());

    if form.password1 != form.password2 {
        return respond(&mut site, pages::sign_up(&saved, Some(PASSWORD_MISMATCH))).await;
    }

    match register(&state.backend, &mut site, &form).await? {
        Registration::Complete(user) => {
            tracing::info!("Registered user {}", user.id);
            site.set_user(user);
            respond(&mut site, redirect_to(paths::HOME)).await
        }
        Registration::Rejected(message) => {
            site.clear_user();
            respond(&mut site, pages::sign_up(&saved, Some(&message))).await
        }
    }
}

enum Registration {
    Complete(UserRecord),
    Rejected(String),
}

async fn register(
    backend: &Backend,
    site: &mut SiteSession,
    form: &SignUpForm,
) -> Result<Registration, AppError> {
    let payload = CreateUserPayload {
        username: &form.username,
        email: &form.email,
        password: &form.password1,
        first_name: &form.first_name,
        last_name: &form.last_name,
        relationship: &form.relationship,
        vital_status: &form.vital_status,
    };
    let response = backend.create_user(site, &payload).await?;
    if !response.is_success() {
        return Ok(rejected("create user", &response));
    }
    let user: UserRecord = response.parse()?;

    let payload = CreateAccountPayload {
        user_id: user.id,
        dob: &form.dob,
    };
    let response = match backend.create_account(site, &payload).await {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            rollback(backend, site, user.id, None).await;
            return Ok(rejected("create account", &response));
        }
        Err(e) => {
            rollback(backend, site, user.id, None).await;
            return Err(e);
        }
    };
    let account_id = response.body.get("id").and_then(Value::as_i64);

    let member = MemberForm {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        dob: form.dob.clone(),
        vital_status: form.vital_status.clone(),
        relationship: form.relationship.clone(),
    }
    .into_payload(user.id);
    match backend.create_member(site, &member).await {
        Ok(response) if response.is_success() => Ok(Registration::Complete(user)),
        Ok(response) => {
            rollback(backend, site, user.id, account_id).await;
            Ok(rejected("create member", &response))
        }
        Err(e) => {
            rollback(backend, site, user.id, account_id).await;
            Err(e)
        }
    }
}

fn rejected(step: &str, response: &ApiResponse) -> Registration {
    let message = response.message();
    tracing::warn!("Sign-up step '{}' rejected ({}): {}", step, response.status, message);
    Registration::Rejected(message)
}

/// Undo the records created so far, newest first. Failures are logged only.
async fn rollback(backend: &Backend, site: &mut SiteSession, user_id: i64, account_id: Option<i64>) {
    if let Some(id) = account_id {
        report("account", id, backend.delete_account(site, id).await);
    }
    report("user", user_id, backend.delete_user(site, user_id).await);
}

fn report(kind: &str, id: i64, outcome: Result<ApiResponse, AppError>) {
    match outcome {
        Ok(response) if response.is_success() => {
            tracing::info!("Rolled back {} {}", kind, id)
        }
        Ok(response) => tracing::warn!(
            "Could not roll back {} {} ({}): {}",
            kind,
            id,
            response.status,
            response.message()
        ),
        Err(e) => tracing::warn!("Could not roll back {} {}: {}", kind, id, e),
    }
}
