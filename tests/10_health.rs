mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };

    let res = app.client.get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };

    let body: serde_json::Value = app.client.get(format!("{}/", app.base_url)).send().await?.json().await?;
    assert_eq!(body["data"]["name"], "Text2SQL API");
    assert!(body["data"]["endpoints"]["query"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_bearer() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };

    let res = app.client.get(app.url("/users/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = app.client.get(app.url("/users/me")).bearer_auth("not-a-jwt").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn metered_routes_require_credentials() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };

    let res = app
        .client
        .post(app.url("/query/chat"))
        .json(&serde_json::json!({ "prompt": "how many users?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "API key is required. Please provide X-API-Key header.");

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", "nope")
        .json(&serde_json::json!({ "prompt": "how many users?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Invalid API key.");
    Ok(())
}

#[tokio::test]
async fn refresh_tokens_are_not_access_tokens() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;

    let body: serde_json::Value = app
        .client
        .post(app.url("/users/sign-in"))
        .json(&serde_json::json!({ "email": user.email, "password": user.password, "remember_me": true }))
        .send()
        .await?
        .json()
        .await?;
    let refresh = body["data"]["refresh_token"].as_str().context("missing refresh_token")?;

    let res = app.client.get(app.url("/tools")).bearer_auth(refresh).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "Please provide an access token");
    Ok(())
}

#[tokio::test]
async fn expired_api_keys_are_refused() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let expired = chrono::Utc::now() - chrono::Duration::hours(1);

    let body: serde_json::Value = app
        .client
        .post(app.url("/api-keys"))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({ "name": "old", "expires_at": expired }))
        .send()
        .await?
        .json()
        .await?;
    let key = body["data"]["api_key"].as_str().context("missing api_key")?;

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", key)
        .json(&serde_json::json!({ "prompt": "how many users?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], "API key has expired.");
    Ok(())
}
