//! Thin JSON client for the family API.
//!
//! Every call returns the status code together with the parsed body; deciding
//! what a non-2xx status means is left to the caller. Only transport failures
//! and unreadable bodies are errors here.

pub mod backend;

use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

pub use backend::Backend;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable response body ({status}): {message}")]
    Decode { status: StatusCode, message: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How an outbound request authenticates itself.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    None,
    /// A complete `Authorization` header value, e.g. `Bearer abc`.
    Header(&'a str),
    Basic { username: &'a str, password: &'a str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// User-facing message carried by an error body. The family API uses
    /// `message`; the token endpoint uses OAuth's `error_description`/`error`.
    pub fn message(&self) -> String {
        ["message", "error_description", "detail", "error"]
            .iter()
            .find_map(|key| self.body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "The family service rejected the request ({}).",
                    self.status.as_u16()
                )
            })
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_value(self.body.clone()).map_err(|e| ClientError::Decode {
            status: self.status,
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Paths are appended to the base URL verbatim so a base with its own
    /// path prefix keeps it.
    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    fn request(&self, method: Method, path: &str, auth: Auth<'_>) -> Result<RequestBuilder, ClientError> {
        let builder = self.http.request(method, self.url(path)?);
        Ok(match auth {
            Auth::None => builder,
            Auth::Header(value) => builder.header(AUTHORIZATION, value),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        })
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        auth: Auth<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let mut builder = self.request(method.clone(), path, auth)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!("{} {}", method, path);
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // DELETE and friends may legitimately answer with an empty body.
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
                status,
                message: e.to_string(),
            })?
        };

        Ok(ApiResponse { status, body })
    }

    pub async fn get(&self, path: &str, auth: Auth<'_>) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, path, None, auth).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(&body), auth).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth<'_>,
    ) -> Result<ApiResponse, ClientError> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, Some(&body), auth).await
    }

    pub async fn delete(&self, path: &str, auth: Auth<'_>) -> Result<ApiResponse, ClientError> {
        self.send(Method::DELETE, path, None, auth).await
    }

    /// Reachability check against the base URL; any HTTP answer counts.
    pub async fn probe(&self) -> Result<StatusCode, ClientError> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        Ok(response.status())
    }
}
