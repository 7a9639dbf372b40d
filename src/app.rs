use std::sync::Arc;

use axum::{routing::get, Router};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::auth::TokenCache;
use crate::client::{ApiClient, Backend, ClientError};
use crate::config::AppConfig;
use crate::handlers::{account, auth, health, home, members, paths, sign_up};

/// Shared by every request. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Backend,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ClientError> {
        let client = ApiClient::new(&config.backend)?;
        let tokens = TokenCache::new(
            client.clone(),
            config.credentials.clone(),
            config.backend.token_refresh_margin,
        );

        Ok(Self {
            backend: Backend::new(client, tokens),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.session.secure_cookie)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            state.config.session.idle_minutes,
        )));

    Router::new()
        .merge(auth_routes())
        .merge(page_routes())
        .merge(member_routes())
        .route(paths::HEALTH, get(health::get))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(paths::INDEX, get(auth::index))
        .route(paths::LOGIN, get(auth::login_get).post(auth::login_post))
        .route(paths::SIGN_UP, get(sign_up::get).post(sign_up::post))
        .route(paths::LOGOUT, get(auth::logout).post(auth::logout))
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route(paths::HOME, get(home::get))
        .route("/account/update/:pk/", get(account::get).post(account::post))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route(paths::MEMBERS, get(members::add_get).post(members::add_post))
        .route(
            "/members/update/:pk/",
            get(members::update_get).post(members::update_post),
        )
        .route(
            "/members/delete/:pk/",
            get(members::delete_get).post(members::delete_post),
        )
}
