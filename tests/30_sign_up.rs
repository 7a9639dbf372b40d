mod common;

use anyhow::Result;
use common::TestSite;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const CREATE_USER: &str = "/api/v1/users/create_user/";
const CREATE_ACCOUNT: &str = "/api/v1/accounts/create_account/";
const MEMBERS: &str = "/api/v1/members/";

fn form(password2: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("username", "ada"),
        ("email", "ada@example.com"),
        ("password1", "secret-1"),
        ("password2", password2),
        ("first_name", "Ada"),
        ("last_name", "Byron"),
        ("dob", "1815-12-10"),
        ("relationship", "self"),
        ("vital_status", "living"),
    ]
}

fn new_user() -> serde_json::Value {
    json!({"id": 7, "first_name": "Ada", "last_name": "Byron"})
}

#[tokio::test]
async fn password_mismatch_never_reaches_the_backend() -> Result<()> {
    let mut site = TestSite::start().await?;

    let page = site.post("/sign_up/", &form("secret-2")).await?;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Passwords do not match."));
    assert!(page.body.contains(r#"value="ada@example.com""#));

    assert!(site.backend.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn sign_up_creates_user_account_and_member_in_order() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock_token(1).await;

    Mock::given(method("POST"))
        .and(path(CREATE_USER))
        .and(body_json(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "secret-1",
            "first_name": "Ada",
            "last_name": "Byron",
            "relationship": "self",
            "vital_status": "living"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(new_user()))
        .expect(1)
        .mount(&site.backend)
        .await;

    Mock::given(method("POST"))
        .and(path(CREATE_ACCOUNT))
        .and(body_json(json!({"user_id": 7, "dob": "1815-12-10"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "user": 7})))
        .expect(1)
        .mount(&site.backend)
        .await;

    Mock::given(method("POST"))
        .and(path(MEMBERS))
        .and(body_json(json!({
            "first_name": "Ada",
            "last_name": "Byron",
            "vital_status": "living",
            "dob": "1815-12-10",
            "relationship": "self",
            "user": 7
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 11})))
        .expect(1)
        .mount(&site.backend)
        .await;

    let page = site.post("/sign_up/", &form("secret-1")).await?;
    assert!(page.redirects_to("/home/"), "{:?}", page);

    assert_eq!(
        site.backend_calls().await,
        vec![
            format!("POST {}", CREATE_USER),
            format!("POST {}", CREATE_ACCOUNT),
            format!("POST {}", MEMBERS),
        ]
    );

    // Now logged in.
    assert!(site.get("/login/").await?.redirects_to("/home/"));
    Ok(())
}

#[tokio::test]
async fn rejected_user_creation_is_shown_on_the_form() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock_token(1).await;
    site.mock("POST", CREATE_USER, 400, json!({"message": "Username already taken"}))
        .await;

    let page = site.post("/sign_up/", &form("secret-1")).await?;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Username already taken"));
    assert_eq!(site.backend_calls().await, vec![format!("POST {}", CREATE_USER)]);
    Ok(())
}

#[tokio::test]
async fn failed_account_creation_removes_the_new_user() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock_token(1).await;
    site.mock("POST", CREATE_USER, 200, new_user()).await;
    site.mock("POST", CREATE_ACCOUNT, 400, json!({"message": "Invalid date of birth"}))
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/users/7/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&site.backend)
        .await;

    let page = site.post("/sign_up/", &form("secret-1")).await?;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Invalid date of birth"));
    assert!(page.body.contains(r#"value="ada""#));

    assert_eq!(
        site.backend_calls().await,
        vec![
            format!("POST {}", CREATE_USER),
            format!("POST {}", CREATE_ACCOUNT),
            "DELETE /api/v1/users/7/".to_string(),
        ]
    );

    assert!(site.get("/home/").await?.redirects_to("/login/"));
    Ok(())
}

#[tokio::test]
async fn failed_member_creation_removes_account_then_user() -> Result<()> {
    let mut site = TestSite::start().await?;
    site.mock_token(1).await;
    site.mock("POST", CREATE_USER, 200, new_user()).await;
    site.mock("POST", CREATE_ACCOUNT, 200, json!({"id": 3, "user": 7})).await;
    site.mock("POST", MEMBERS, 400, json!({"message": "Relationship is required"}))
        .await;
    site.mock("DELETE", "/api/v1/accounts/3/", 200, json!({})).await;
    site.mock("DELETE", "/api/v1/users/7/", 200, json!({})).await;

    let page = site.post("/sign_up/", &form("secret-1")).await?;
    assert_eq!(page.status, 200);
    assert!(page.body.contains("Relationship is required"));

    assert_eq!(
        site.backend_calls().await,
        vec![
            format!("POST {}", CREATE_USER),
            format!("POST {}", CREATE_ACCOUNT),
            format!("POST {}", MEMBERS),
            "DELETE /api/v1/accounts/3/".to_string(),
            "DELETE /api/v1/users/7/".to_string(),
        ]
    );

    assert!(site.get("/home/").await?.redirects_to("/login/"));
    Ok(())
}
