mod common;

use anyhow::Result;
use common::{account, ada, token_body, TestSite, TOKEN_PATH};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Address of a port nothing listens on.
fn closed_port_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn unreachable_backend_is_a_503_page() -> Result<()> {
    let mut site = TestSite::start_against(&closed_port_url()?).await?;

    let page = site
        .post(
            "/login/",
            &[("username", "ada"), ("email", "ada@example.com"), ("password", "pw")],
        )
        .await?;
    assert_eq!(page.status, 503);
    assert!(page.body.contains("unavailable"));
    Ok(())
}

#[tokio::test]
async fn refused_token_exchange_is_a_503_page() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock("POST", TOKEN_PATH, 401, json!({"error": "invalid_client"}))
        .await;

    let page = site
        .post(
            "/login/",
            &[("username", "ada"), ("email", "ada@example.com"), ("password", "pw")],
        )
        .await?;
    assert_eq!(page.status, 503);
    assert!(site.backend_calls().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_backend_response_is_a_503_page() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock_token(1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/users/get_user/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&site.backend)
        .await;

    let page = site
        .post(
            "/login/",
            &[("username", "ada"), ("email", "ada@example.com"), ("password", "pw")],
        )
        .await?;
    assert_eq!(page.status, 503);
    Ok(())
}

#[tokio::test]
async fn backend_401_reacquires_the_token_once() -> Result<()> {
    let mut site = TestSite::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(2)
        .mount(&site.backend)
        .await;

    site.log_in(ada()).await?;

    // First answer is a 401, the retry succeeds.
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/get_account_from_user_id/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .up_to_n_times(1)
        .mount(&site.backend)
        .await;
    site.mock("POST", "/api/v1/accounts/get_account_from_user_id/", 200, account())
        .await;

    let page = site.get("/home/").await?;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("ada@example.com"));

    assert_eq!(site.token_exchanges().await, 2);
    Ok(())
}

#[tokio::test]
async fn oversized_token_lifetime_is_treated_as_no_expiry() -> Result<()> {
    let mut site = TestSite::start().await?;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 9_000_000_000_000_000_i64
        })))
        .expect(1)
        .mount(&site.backend)
        .await;
    site.mock("POST", "/api/v1/accounts/get_account_from_user_id/", 200, account())
        .await;
    site.log_in(ada()).await?;

    assert_eq!(site.get("/home/").await?.status, 200);
    assert_eq!(site.get("/home/").await?.status, 200);
    assert_eq!(site.token_exchanges().await, 1);
    Ok(())
}

#[tokio::test]
async fn token_survives_a_failed_backend_call() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock_token(1).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/users/get_user/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(1)
        .mount(&site.backend)
        .await;

    let page = site
        .post(
            "/login/",
            &[("username", "ada"), ("email", "ada@example.com"), ("password", "pw")],
        )
        .await?;
    assert_eq!(page.status, 503);

    site.log_in(ada()).await?;
    assert_eq!(site.token_exchanges().await, 1);
    Ok(())
}

#[tokio::test]
async fn health_reports_backend_reachability() -> Result<()> {
    let mut site = TestSite::start().await?;

    let page = site.get("/health").await?;
    assert_eq!(page.status, 200);
    let body: Value = serde_json::from_str(&page.body)?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"]["reachable"], true);

    let mut down = TestSite::start_against(&closed_port_url()?).await?;
    let page = down.get("/health").await?;
    assert_eq!(page.status, 503);
    let body: Value = serde_json::from_str(&page.body)?;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["backend"]["reachable"], false);
    Ok(())
}
