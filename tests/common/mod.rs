#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, request::Builder, Request, StatusCode},
    Router,
};
use family_site::app::{self, AppState};
use family_site::config::AppConfig;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/o/token/";
pub const BEARER: &str = "Bearer test-token";

/// What the browser saw.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl Page {
    pub fn redirects_to(&self, target: &str) -> bool {
        self.status == StatusCode::FOUND && self.location.as_deref() == Some(target)
    }
}

/// The site wired to a wiremock stand-in for the family API, plus a one-cookie
/// jar so consecutive requests share a browser session.
pub struct TestSite {
    pub backend: MockServer,
    app: Router,
    cookie: Option<String>,
}

impl TestSite {
    pub async fn start() -> Result<Self> {
        let backend = MockServer::start().await;
        let app = router_for(&backend.uri())?;
        Ok(Self {
            backend,
            app,
            cookie: None,
        })
    }

    /// Site pointed somewhere other than the mock server (e.g. a closed port).
    pub async fn start_against(api_url: &str) -> Result<Self> {
        Ok(Self {
            backend: MockServer::start().await,
            app: router_for(api_url)?,
            cookie: None,
        })
    }

    /// Start a fresh browser session.
    pub fn forget_cookie(&mut self) {
        self.cookie = None;
    }

    pub async fn get(&mut self, uri: &str) -> Result<Page> {
        self.send(Request::builder().method("GET").uri(uri), Body::empty()).await
    }

    pub async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> Result<Page> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(builder, Body::from(form)).await
    }

    async fn send(&mut self, mut builder: Builder, body: Body) -> Result<Page> {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.as_str());
        }

        let response = self.app.clone().oneshot(builder.body(body)?).await?;

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str()?;
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            self.cookie = if set_cookie.contains("Max-Age=0") || pair.ends_with('=') {
                None
            } else {
                Some(pair.to_string())
            };
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().map(str::to_string))
            .transpose()?;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("failed to read response body")?;

        Ok(Page {
            status,
            location,
            body: String::from_utf8(bytes.to_vec())?,
        })
    }

    /// Token endpoint answering with a long-lived token, expected `times` times.
    pub async fn mock_token(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(times)
            .mount(&self.backend)
            .await;
    }

    pub async fn mock(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    /// Log in as `user` (the `get_user` answer). Does not mount the token mock.
    pub async fn log_in(&mut self, user: Value) -> Result<()> {
        self.mock("POST", "/api/v1/users/get_user/", 200, user).await;
        let page = self
            .post(
                "/login/",
                &[("username", "ada"), ("email", "ada@example.com"), ("password", "pw")],
            )
            .await?;
        anyhow::ensure!(page.redirects_to("/home/"), "login failed: {:?}", page);
        Ok(())
    }

    /// `METHOD /path` of every non-token call the backend received, in order.
    pub async fn backend_calls(&self) -> Vec<String> {
        self.backend
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() != TOKEN_PATH)
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }

    pub async fn token_exchanges(&self) -> usize {
        self.backend
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == TOKEN_PATH)
            .count()
    }
}

pub fn router_for(api_url: &str) -> Result<Router> {
    let api_url = api_url.to_string();
    let config = AppConfig::from_lookup(|key| match key {
        "API_URL" => Some(api_url.clone()),
        "CLIENT_ID" => Some("site-client".to_string()),
        "CLIENT_SECRET" => Some("site-secret".to_string()),
        "CLIENT_USER" => Some("service".to_string()),
        "CLIENT_PASSWORD" => Some("service-pw".to_string()),
        "API_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })?;
    Ok(app::router(AppState::new(config)?))
}

pub fn token_body() -> Value {
    json!({
        "access_token": "test-token",
        "token_type": "Bearer",
        "expires_in": 36000,
        "refresh_token": "test-refresh",
        "scope": "read write"
    })
}

pub fn ada() -> Value {
    json!({"id": 1, "first_name": "Ada", "last_name": "Byron", "email": "ada@example.com"})
}

pub fn account() -> Value {
    json!({
        "id": 4,
        "dob": "1815-12-10",
        "user": {"email": "ada@example.com", "first_name": "Ada", "last_name": "Byron"}
    })
}
