mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// User with a subscription of `tokens` and an API key
async fn funded_user(app: &common::TestApp, tokens: i64) -> Result<(common::SignedUp, String)> {
    let user = app.sign_up().await?;
    let admin = app.sign_up_admin().await?;
    let plan_id = app.create_plan(&admin.token, tokens).await?;
    app.subscribe(&user.token, user.user_id, plan_id).await?;

    let body: Value = app
        .client
        .post(app.url("/api-keys"))
        .bearer_auth(&user.token)
        .json(&json!({ "name": "query" }))
        .send()
        .await?
        .json()
        .await?;
    let key = body["data"]["api_key"].as_str().context("missing api_key")?.to_string();
    Ok((user, key))
}

#[tokio::test]
async fn chat_deducts_reported_tokens() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let database_url = std::env::var("DATABASE_URL")?;
    let (user, key) = funded_user(&app, 10_000).await?;

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?", "db_url": database_url }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let data = &body["data"];

    assert!(data["used_tool"].is_null());
    assert_eq!(data["sql_query"], "SELECT 1 AS one;");
    assert_eq!(data["result"], json!([{ "one": 1 }]));
    assert!(data["answer"].as_str().is_some_and(|a| !a.is_empty()));

    // Selection, generation and summary calls
    let per_call = common::CALL_USAGE.0 + common::CALL_USAGE.1;
    let spent = (per_call * 3) as i64;
    assert_eq!(data["token_usage"]["total_tokens"], spent);
    assert_eq!(data["tokens_remaining"], 10_000 - spent);

    let body: Value = app
        .client
        .get(app.url(&format!("/subscriptions/user/{}", user.user_id)))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["tokens_remaining"], 10_000 - spent);
    assert_eq!(body["data"]["total_tokens_purchased"], 10_000);

    let body: Value = app
        .client
        .get(app.url("/usage/my/usage"))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["chat_usage"], 1);
    Ok(())
}

#[tokio::test]
async fn chat_accepts_bearer_token() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let database_url = std::env::var("DATABASE_URL")?;
    let (user, _) = funded_user(&app, 10_000).await?;

    let res = app
        .client
        .post(app.url("/query/chat"))
        .bearer_auth(&user.token)
        .json(&json!({ "prompt": "what is one?", "db_url": database_url }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn low_balance_is_refused() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let database_url = std::env::var("DATABASE_URL")?;
    let (user, key) = funded_user(&app, 100).await?;

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?", "db_url": database_url }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().is_some_and(|e| e.starts_with("Insufficient tokens")));

    // Nothing was charged
    let body: Value = app
        .client
        .get(app.url(&format!("/subscriptions/user/{}", user.user_id)))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["tokens_remaining"], 100);
    Ok(())
}

#[tokio::test]
async fn chat_needs_exactly_one_owned_target() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let database_url = std::env::var("DATABASE_URL")?;
    let (_, key) = funded_user(&app, 10_000).await?;
    let stranger = app.sign_up().await?;

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = app
        .client
        .post(app.url("/databases"))
        .bearer_auth(&stranger.token)
        .json(&json!({
            "host": "db.internal",
            "port": 5432,
            "username": "sales_user",
            "password": "secret",
            "database_name": "sales",
        }))
        .send()
        .await?
        .json()
        .await?;
    let db_id = body["data"]["db_id"].as_str().context("missing db_id")?.to_string();

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?", "db_url": database_url, "db_id": db_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?", "db_id": db_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?", "db_url": "mysql://u:p@localhost:3306/sales" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unreachable_target_is_reported_and_not_charged() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let (user, key) = funded_user(&app, 10_000).await?;

    let res = app
        .client
        .post(app.url("/query/chat"))
        .header("X-API-Key", &key)
        .json(&json!({ "prompt": "what is one?", "db_url": "postgres://u:p@127.0.0.1:1/sales" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    let error = body["error"].as_str().context("missing error")?;
    assert!(error.starts_with("Could not connect to target database"));
    assert!(!error.contains("u:p@"));

    let body: Value = app
        .client
        .get(app.url(&format!("/subscriptions/user/{}", user.user_id)))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["tokens_remaining"], 10_000);
    Ok(())
}
