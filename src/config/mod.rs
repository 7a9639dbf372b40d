use secrecy::SecretString;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub credentials: Arc<ServiceCredentials>,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Tokens are treated as stale this long before the backend says they expire.
    pub token_refresh_margin: Duration,
}

/// Service account used for the machine token exchange. Independent of the
/// human user's own credentials.
#[derive(Debug)]
pub struct ServiceCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub grant_type: String,
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_minutes: i64,
    pub secure_cookie: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup so callers (and tests)
    /// don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let base_url = lookup("API_URL").ok_or(ConfigError::Missing("API_URL"))?;
        let base_url = Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            key: "API_URL",
            message: e.to_string(),
        })?;

        let credentials = ServiceCredentials {
            client_id: lookup("CLIENT_ID").unwrap_or_default(),
            client_secret: SecretString::from(lookup("CLIENT_SECRET").unwrap_or_default()),
            grant_type: lookup("GRANT_TYPE").unwrap_or_else(|| "password".to_string()),
            username: lookup("CLIENT_USER").unwrap_or_default(),
            password: SecretString::from(lookup("CLIENT_PASSWORD").unwrap_or_default()),
        };

        let mut config = match environment {
            Environment::Production => Self::production(base_url, credentials),
            Environment::Staging => Self::staging(base_url, credentials),
            Environment::Development => Self::development(base_url, credentials),
        };
        config.apply_overrides(&lookup)?;

        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse("PORT", &v)?;
        }

        // Backend overrides
        if let Some(v) = lookup("API_TIMEOUT_SECS") {
            self.backend.timeout = Duration::from_secs(parse("API_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("TOKEN_REFRESH_MARGIN_SECS") {
            self.backend.token_refresh_margin =
                Duration::from_secs(parse("TOKEN_REFRESH_MARGIN_SECS", &v)?);
        }

        // Session overrides
        if let Some(v) = lookup("SESSION_IDLE_MINUTES") {
            self.session.idle_minutes = parse("SESSION_IDLE_MINUTES", &v)?;
        }
        if let Some(v) = lookup("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = parse("SESSION_SECURE_COOKIE", &v)?;
        }

        Ok(())
    }

    fn development(base_url: Url, credentials: ServiceCredentials) -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
            },
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(30),
                token_refresh_margin: Duration::from_secs(30),
            },
            credentials: Arc::new(credentials),
            session: SessionConfig {
                idle_minutes: 24 * 60,
                secure_cookie: false,
            },
        }
    }

    fn staging(base_url: Url, credentials: ServiceCredentials) -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
            },
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(15),
                token_refresh_margin: Duration::from_secs(60),
            },
            credentials: Arc::new(credentials),
            session: SessionConfig {
                idle_minutes: 8 * 60,
                secure_cookie: true,
            },
        }
    }

    fn production(base_url: Url, credentials: ServiceCredentials) -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
            },
            backend: BackendConfig {
                base_url,
                timeout: Duration::from_secs(10),
                token_refresh_margin: Duration::from_secs(60),
            },
            credentials: Arc::new(credentials),
            session: SessionConfig {
                idle_minutes: 2 * 60,
                secure_cookie: true,
            },
        }
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
