mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "school_id": "2021-00001" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "School ID and password are required");

    Ok(())
}

#[tokio::test]
async fn unknown_account_never_logs_in() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "school_id": "no-such-account", "password": "whatever" }))
        .send()
        .await?;

    // 401 with a database, 500 when the server runs without one
    assert!(
        res.status() == StatusCode::UNAUTHORIZED || res.status() == StatusCode::INTERNAL_SERVER_ERROR,
        "unexpected status {}",
        res.status()
    );
    let body = res.json::<Value>().await?;
    assert!(body.get("error").is_some(), "error body: {}", body);
    assert!(body.get("token").is_none());

    Ok(())
}

#[tokio::test]
async fn registration_validates_before_storage() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({
            "school_id": "2021-00009",
            "password": "short",
            "full_name": "Test User",
            "email": "test@example.edu",
            "role": "Staff",
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["error"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn forged_refresh_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/auth/refresh"))
        .json(&json!({ "refreshToken": "not.a.token" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Invalid refresh token");

    Ok(())
}

#[tokio::test]
async fn protected_routes_demand_a_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/records", "/requests", "/reports/dashboard", "/auth/profile"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);

        let res = client.get(server.url(path)).bearer_auth("garbage").send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body = res.json::<Value>().await?;
        assert_eq!(body["error"], "Invalid token");
    }

    Ok(())
}
