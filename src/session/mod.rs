//! Typed view over the browser session.
//!
//! Everything the site keeps per browser lives in one [`SessionState`] value
//! stored under [`STATE_KEY`]. Handlers mutate it through [`SiteSession`] and
//! call [`SiteSession::commit`] before answering.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::auth::token::TokenBundle;
use crate::error::AppError;
use crate::models::{Account, SavedSignUpForm, UserRecord};

pub const STATE_KEY: &str = "family_site.state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Present iff the visitor is logged in.
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub account: Option<Account>,
    /// Cached service token bundle.
    #[serde(default)]
    pub api_session: Option<TokenBundle>,
    #[serde(default)]
    pub saved_username: Option<String>,
    #[serde(default)]
    pub saved_signup_form: Option<SavedSignUpForm>,
    #[serde(default)]
    pub messages: Vec<FlashMessage>,
}

pub struct SiteSession {
    session: Session,
    state: SessionState,
    dirty: bool,
}

impl SiteSession {
    pub async fn load(session: Session) -> Result<Self, AppError> {
        let state = session
            .get::<SessionState>(STATE_KEY)
            .await?
            .unwrap_or_default();
        Ok(Self {
            session,
            state,
            dirty: false,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.state.user.as_ref()
    }

    pub fn set_user(&mut self, user: UserRecord) {
        self.state.user = Some(user);
        self.dirty = true;
    }

    pub fn clear_user(&mut self) {
        self.state.user = None;
        self.state.account = None;
        self.dirty = true;
    }

    pub fn set_account(&mut self, account: Option<Account>) {
        self.state.account = account;
        self.dirty = true;
    }

    pub fn api_session(&self) -> Option<&TokenBundle> {
        self.state.api_session.as_ref()
    }

    pub fn set_api_session(&mut self, bundle: TokenBundle) {
        self.state.api_session = Some(bundle);
        self.dirty = true;
    }

    pub fn clear_api_session(&mut self) {
        self.state.api_session = None;
        self.dirty = true;
    }

    pub fn saved_username(&self) -> &str {
        self.state.saved_username.as_deref().unwrap_or_default()
    }

    pub fn set_saved_username(&mut self, username: impl Into<String>) {
        self.state.saved_username = Some(username.into());
        self.dirty = true;
    }

    pub fn saved_signup_form(&self) -> SavedSignUpForm {
        self.state.saved_signup_form.clone().unwrap_or_default()
    }

    pub fn set_saved_signup_form(&mut self, form: SavedSignUpForm) {
        self.state.saved_signup_form = Some(form);
        self.dirty = true;
    }

    pub fn push_message(&mut self, level: Level, text: impl Into<String>) {
        self.state.messages.push(FlashMessage {
            level,
            text: text.into(),
        });
        self.dirty = true;
    }

    pub fn take_messages(&mut self) -> Vec<FlashMessage> {
        if self.state.messages.is_empty() {
            return Vec::new();
        }
        self.dirty = true;
        std::mem::take(&mut self.state.messages)
    }

    /// Write pending changes to the session store. No-op when nothing changed,
    /// so anonymous page views don't mint session cookies.
    pub async fn commit(&mut self) -> Result<(), AppError> {
        if !self.dirty {
            return Ok(());
        }
        self.session.insert(STATE_KEY, &self.state).await?;
        self.dirty = false;
        Ok(())
    }

    /// Drop everything, including the session id.
    pub async fn flush(&mut self) -> Result<(), AppError> {
        self.session.flush().await?;
        self.state = SessionState::default();
        self.dirty = false;
        Ok(())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SiteSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        SiteSession::load(session).await.map_err(IntoResponse::into_response)
    }
}
