// Page-level error types
use axum::{http::StatusCode, response::IntoResponse};

use crate::auth::token::TokenError;
use crate::client::ClientError;
use crate::render;

/// Request-scoped failure that aborts the current page with an error page.
///
/// Upstream *validation* failures are not errors at this level: handlers show
/// them on the originating form. This type covers everything that prevents the
/// page from being produced at all.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    Internal(String),

    // 503 Service Unavailable (backend unreachable or refusing the site)
    ServiceUnavailable(String),
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            AppError::Internal(msg) => msg,
            AppError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        AppError::ServiceUnavailable(message.into())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(e) => {
                tracing::error!("Backend request failed: {}", e);
                AppError::service_unavailable("The family service is unavailable, please try again later")
            }
            ClientError::Decode { status, message } => {
                tracing::error!("Backend returned an unreadable response ({}): {}", status, message);
                AppError::service_unavailable("The family service returned an unexpected response")
            }
            ClientError::InvalidUrl(msg) => {
                tracing::error!("Invalid backend URL: {}", msg);
                AppError::internal("An error occurred while processing your request")
            }
            ClientError::Encode(e) => {
                tracing::error!("Failed to encode backend payload: {}", e);
                AppError::internal("An error occurred while processing your request")
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Client(e) => e.into(),
            TokenError::Rejected { status, message } => {
                tracing::error!("Service token exchange rejected ({}): {}", status, message);
                AppError::service_unavailable("Unable to authenticate with the family service")
            }
            TokenError::MissingAccessToken => {
                tracing::error!("Service token exchange returned no access_token");
                AppError::service_unavailable("Unable to authenticate with the family service")
            }
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        tracing::error!("Session store error: {}", err);
        AppError::internal("Your session could not be loaded")
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, render::pages::error(status, self.message())).into_response()
    }
}
