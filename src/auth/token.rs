use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::client::{backend::paths, ApiClient, Auth, ClientError};
use crate::config::ServiceCredentials;
use crate::session::SiteSession;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("token exchange rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("token response carried no access_token")]
    MissingAccessToken,
}

/// The token endpoint's answer, plus when we received it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds as reported by the token endpoint.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "Utc::now")]
    pub obtained_at: DateTime<Utc>,
}

impl TokenBundle {
    fn from_response(body: Value) -> Result<Self, TokenError> {
        match body.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {}
            _ => return Err(TokenError::MissingAccessToken),
        }
        let mut bundle: TokenBundle =
            serde_json::from_value(body).map_err(|_| TokenError::MissingAccessToken)?;
        bundle.obtained_at = Utc::now();
        Ok(bundle)
    }

    /// `None` when the lifetime is missing or too large to represent.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let lifetime = Duration::try_seconds(self.expires_in?)?;
        self.obtained_at.checked_add_signed(lifetime)
    }

    /// A bundle without a usable expiry never goes stale locally; the
    /// backend's 401 is then the only signal.
    pub fn is_stale(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match (self.expires_at(), now.checked_add_signed(margin)) {
            (Some(expires_at), Some(deadline)) => deadline >= expires_at,
            _ => false,
        }
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Per-session cache of the service access token.
///
/// The token is acquired lazily on the first backend call of a browser session,
/// kept in that session, and reused until it is about to expire. A stale
/// token is refreshed when the bundle carries a refresh token, otherwise (or if
/// the refresh is refused) a fresh exchange is made.
#[derive(Debug, Clone)]
pub struct TokenCache {
    client: ApiClient,
    credentials: Arc<ServiceCredentials>,
    refresh_margin: Duration,
}

impl TokenCache {
    pub fn new(
        client: ApiClient,
        credentials: Arc<ServiceCredentials>,
        refresh_margin: std::time::Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            refresh_margin: Duration::from_std(refresh_margin).unwrap_or_else(|_| Duration::zero()),
        }
    }

    /// `Authorization` header value for the next backend call made on behalf
    /// of this session.
    pub async fn auth_header(&self, session: &mut SiteSession) -> Result<String, TokenError> {
        let bundle = match session.api_session() {
            Some(bundle) if !bundle.is_stale(Utc::now(), self.refresh_margin) => {
                tracing::debug!("Reusing cached service token");
                return Ok(bundle.header_value());
            }
            Some(stale) => {
                let stale = stale.clone();
                self.renew(&stale).await?
            }
            None => self.exchange().await?,
        };

        let header = bundle.header_value();
        session.set_api_session(bundle);
        Ok(header)
    }

    /// Forget the cached token so the next call re-authenticates.
    pub fn invalidate(&self, session: &mut SiteSession) {
        session.clear_api_session();
    }

    /// Exchange the configured service credentials for a new token.
    pub async fn exchange(&self) -> Result<TokenBundle, TokenError> {
        tracing::info!("Requesting service token for '{}'", self.credentials.username);
        let body = json!({
            "grant_type": self.credentials.grant_type,
            "username": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
        });
        self.request_token(&body).await
    }

    async fn renew(&self, stale: &TokenBundle) -> Result<TokenBundle, TokenError> {
        if let Some(refresh_token) = stale.refresh_token.as_deref() {
            tracing::debug!("Refreshing stale service token");
            let body = json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            });
            match self.request_token(&body).await {
                Ok(bundle) => return Ok(bundle),
                Err(e) => tracing::warn!("Token refresh failed, re-authenticating: {}", e),
            }
        }
        self.exchange().await
    }

    async fn request_token(&self, body: &Value) -> Result<TokenBundle, TokenError> {
        let auth = Auth::Basic {
            username: &self.credentials.client_id,
            password: self.credentials.client_secret.expose_secret(),
        };
        let response = self.client.post(paths::TOKEN, body, auth).await?;

        if !response.is_success() {
            return Err(TokenError::Rejected {
                status: response.status,
                message: response.message(),
            });
        }

        TokenBundle::from_response(response.body)
    }
}
