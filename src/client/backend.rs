use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};

use super::{ApiClient, ApiResponse, Auth};
use crate::auth::TokenCache;
use crate::error::AppError;
use crate::models::{
    AccountUpdatePayload, CreateAccountPayload, CreateUserPayload, GetUserPayload, MemberPayload,
};
use crate::session::SiteSession;

/// Family API paths.
pub mod paths {
    pub const TOKEN: &str = "/o/token/";
    pub const GET_USER: &str = "/api/v1/users/get_user/";
    pub const CREATE_USER: &str = "/api/v1/users/create_user/";
    pub const GET_ACCOUNT_FROM_USER_ID: &str = "/api/v1/accounts/get_account_from_user_id/";
    pub const CREATE_ACCOUNT: &str = "/api/v1/accounts/create_account/";
    pub const MEMBERS: &str = "/api/v1/members/";

    pub fn user(id: i64) -> String {
        format!("/api/v1/users/{}/", id)
    }

    pub fn account(id: i64) -> String {
        format!("/api/v1/accounts/{}/", id)
    }

    pub fn user_account(id: i64) -> String {
        format!("/api/v1/user-account/{}/", id)
    }

    pub fn member(id: i64) -> String {
        format!("/api/v1/members/{}/", id)
    }
}

/// Authenticated access to the family API on behalf of one browser session.
///
/// Every call goes through the session's [`TokenCache`]. When the backend
/// answers 401 the cached token is dropped and the call is retried once
/// with a freshly exchanged token.
#[derive(Debug, Clone)]
pub struct Backend {
    client: ApiClient,
    tokens: TokenCache,
}

impl Backend {
    pub fn new(client: ApiClient, tokens: TokenCache) -> Self {
        Self { client, tokens }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Header for the next call. A newly acquired token is written to the
    /// session store right away so a failing call doesn't lose it.
    async fn authorize(&self, session: &mut SiteSession) -> Result<String, AppError> {
        let header = self.tokens.auth_header(session).await?;
        session.commit().await?;
        Ok(header)
    }

    async fn call(
        &self,
        session: &mut SiteSession,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, AppError> {
        let header = self.authorize(session).await?;
        let response = self
            .client
            .send(method.clone(), path, body.as_ref(), Auth::Header(&header))
            .await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("{} {} answered 401, re-authenticating once", method, path);
        self.tokens.invalidate(session);
        let header = self.authorize(session).await?;
        Ok(self
            .client
            .send(method, path, body.as_ref(), Auth::Header(&header))
            .await?)
    }

    async fn call_json<B: Serialize>(
        &self,
        session: &mut SiteSession,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, AppError> {
        let body = serde_json::to_value(body).map_err(super::ClientError::from)?;
        self.call(session, method, path, Some(body)).await
    }

    // Users

    pub async fn get_user(
        &self,
        session: &mut SiteSession,
        payload: &GetUserPayload<'_>,
    ) -> Result<ApiResponse, AppError> {
        self.call_json(session, Method::POST, paths::GET_USER, payload).await
    }

    pub async fn create_user(
        &self,
        session: &mut SiteSession,
        payload: &CreateUserPayload<'_>,
    ) -> Result<ApiResponse, AppError> {
        self.call_json(session, Method::POST, paths::CREATE_USER, payload).await
    }

    pub async fn delete_user(&self, session: &mut SiteSession, id: i64) -> Result<ApiResponse, AppError> {
        self.call(session, Method::DELETE, &paths::user(id), None).await
    }

    // Accounts

    pub async fn get_account_from_user_id(
        &self,
        session: &mut SiteSession,
        user_id: i64,
    ) -> Result<ApiResponse, AppError> {
        let body = json!({ "user_id": user_id });
        self.call(session, Method::POST, paths::GET_ACCOUNT_FROM_USER_ID, Some(body)).await
    }

    pub async fn create_account(
        &self,
        session: &mut SiteSession,
        payload: &CreateAccountPayload<'_>,
    ) -> Result<ApiResponse, AppError> {
        self.call_json(session, Method::POST, paths::CREATE_ACCOUNT, payload).await
    }

    pub async fn delete_account(&self, session: &mut SiteSession, id: i64) -> Result<ApiResponse, AppError> {
        self.call(session, Method::DELETE, &paths::account(id), None).await
    }

    pub async fn get_user_account(&self, session: &mut SiteSession, id: i64) -> Result<ApiResponse, AppError> {
        self.call(session, Method::GET, &paths::user_account(id), None).await
    }

    pub async fn update_user_account(
        &self,
        session: &mut SiteSession,
        id: i64,
        payload: &AccountUpdatePayload,
    ) -> Result<ApiResponse, AppError> {
        self.call_json(session, Method::PUT, &paths::user_account(id), payload).await
    }

    // Members

    pub async fn create_member(
        &self,
        session: &mut SiteSession,
        payload: &MemberPayload,
    ) -> Result<ApiResponse, AppError> {
        self.call_json(session, Method::POST, paths::MEMBERS, payload).await
    }

    pub async fn get_member(&self, session: &mut SiteSession, id: i64) -> Result<ApiResponse, AppError> {
        self.call(session, Method::GET, &paths::member(id), None).await
    }

    pub async fn update_member(
        &self,
        session: &mut SiteSession,
        id: i64,
        payload: &MemberPayload,
    ) -> Result<ApiResponse, AppError> {
        self.call_json(session, Method::PUT, &paths::member(id), payload).await
    }

    pub async fn delete_member(&self, session: &mut SiteSession, id: i64) -> Result<ApiResponse, AppError> {
        self.call(session, Method::DELETE, &paths::member(id), None).await
    }
}
