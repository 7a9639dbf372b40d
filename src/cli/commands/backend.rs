// Operator checks against the family API: `token` and `ping`.

use std::time::{Duration, Instant};

use serde_json::json;

use crate::auth::TokenCache;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::client::ApiClient;
use crate::config::AppConfig;

/// One service token exchange. The token itself is never printed.
pub async fn token(config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.backend)?;
    let tokens = TokenCache::new(
        client,
        config.credentials.clone(),
        config.backend.token_refresh_margin,
    );

    match tokens.exchange().await {
        Ok(bundle) => output_success(
            &output_format,
            &format!("Obtained service token for '{}'", config.credentials.username),
            Some(json!({
                "token_type": bundle.token_type,
                "expires_in": bundle.expires_in,
                "expires_at": bundle.expires_at(),
                "scope": bundle.scope,
                "refreshable": bundle.refresh_token.is_some(),
            })),
        ),
        Err(e) => {
            output_error(&output_format, &e.to_string(), Some("TOKEN_EXCHANGE_FAILED"))?;
            Err(anyhow::anyhow!("token exchange failed"))
        }
    }
}

pub async fn ping(config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.backend)?;
    let url = client.base_url().to_string();
    let started = Instant::now();

    match client.probe().await {
        Ok(status) => {
            let elapsed_ms = millis(started.elapsed());
            output_success(
                &output_format,
                &format!("{} answered {} in {} ms", url, status.as_u16(), elapsed_ms),
                Some(json!({
                    "url": url,
                    "status": status.as_u16(),
                    "elapsed_ms": elapsed_ms,
                })),
            )
        }
        Err(e) => {
            output_error(&output_format, &format!("{} is unreachable: {}", url, e), Some("BACKEND_UNREACHABLE"))?;
            Err(anyhow::anyhow!("backend unreachable"))
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
