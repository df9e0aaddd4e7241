mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn plan_crud_is_admin_only() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let admin = app.sign_up_admin().await?;

    let res = app
        .client
        .post(app.url("/plans"))
        .bearer_auth(&user.token)
        .json(&json!({ "title": "x", "monthly_price": 1.0, "yearly_price": 10.0, "price_id": "p", "tokens": 10 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let plan_id = app.create_plan(&admin.token, 20_000).await?;

    let res = app
        .client
        .get(app.url(&format!("/plans/{}", plan_id)))
        .bearer_auth(&user.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tokens"], 20_000);
    assert_eq!(body["data"]["features"], json!(["chat"]));

    let res = app
        .client
        .put(app.url(&format!("/plans/{}", plan_id)))
        .bearer_auth(&admin.token)
        .json(&json!({ "tokens": 30_000 }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tokens"], 30_000);
    assert_eq!(body["data"]["price_id"], "price_test");

    let res = app
        .client
        .delete(app.url(&format!("/plans/{}", plan_id)))
        .bearer_auth(&admin.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .client
        .get(app.url(&format!("/plans/{}", plan_id)))
        .bearer_auth(&admin.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn subscription_seeds_balance_from_plan() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let admin = app.sign_up_admin().await?;
    let plan_id = app.create_plan(&admin.token, 12_000).await?;

    let sub = app.subscribe(&user.token, user.user_id, plan_id).await?;
    assert_eq!(sub["total_tokens_purchased"], 12_000);
    assert_eq!(sub["tokens_remaining"], 12_000);

    // One subscription per user
    let res = app
        .client
        .post(app.url("/subscriptions"))
        .bearer_auth(&user.token)
        .json(&json!({ "user_id": user.user_id, "plan_id": plan_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .post(app.url("/subscriptions"))
        .bearer_auth(&user.token)
        .json(&json!({ "user_id": user.user_id, "plan_id": Uuid::new_v4() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Plan not found");

    let res = app
        .client
        .put(app.url(&format!("/subscriptions/user/{}", user.user_id)))
        .bearer_auth(&admin.token)
        .json(&json!({ "tokens_remaining": -1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn only_admins_change_balances() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let stranger = app.sign_up().await?;
    let admin = app.sign_up_admin().await?;
    let plan_id = app.create_plan(&admin.token, 8_000).await?;
    let path = format!("/subscriptions/user/{}", user.user_id);

    // Subscribing someone else needs admin
    let res = app
        .client
        .post(app.url("/subscriptions"))
        .bearer_auth(&stranger.token)
        .json(&json!({ "user_id": user.user_id, "plan_id": plan_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    app.subscribe(&user.token, user.user_id, plan_id).await?;

    for token in [&user.token, &stranger.token] {
        let res = app
            .client
            .put(app.url(&path))
            .bearer_auth(token)
            .json(&json!({ "tokens_remaining": 1_000_000_000 }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    let res = app.client.get(app.url(&path)).bearer_auth(&stranger.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = app.client.get(app.url(&path)).bearer_auth(&user.token).send().await?.json().await?;
    assert_eq!(body["data"]["tokens_remaining"], 8_000);

    // Partial update leaves the other fields alone
    let res = app
        .client
        .put(app.url(&path))
        .bearer_auth(&admin.token)
        .json(&json!({ "tokens_remaining": 2_500 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["tokens_remaining"], 2_500);
    assert_eq!(body["data"]["total_tokens_purchased"], 8_000);
    assert_eq!(body["data"]["plan_id"], plan_id.to_string());
    Ok(())
}

#[tokio::test]
async fn usage_counters_are_admin_managed() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let stranger = app.sign_up().await?;
    let admin = app.sign_up_admin().await?;

    let body: Value = app
        .client
        .get(app.url("/usage/my/usage"))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    let usage_id = body["data"]["usage_id"].as_str().context("missing usage_id")?.to_string();
    let path = format!("/usage/{}", usage_id);

    let res = app.client.get(app.url(&path)).bearer_auth(&stranger.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.client.get(app.url("/usage")).bearer_auth(&user.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .put(app.url(&path))
        .bearer_auth(&user.token)
        .json(&json!({ "chat_usage": 0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.client.delete(app.url(&path)).bearer_auth(&user.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .put(app.url(&path))
        .bearer_auth(&admin.token)
        .json(&json!({ "chat_usage": 7 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["chat_usage"], 7);
    assert_eq!(body["data"]["invoice_usage"], 0);

    let res = app.client.delete(app.url(&path)).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.client.get(app.url(&path)).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = app.client.delete(app.url(&path)).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn payments_record_and_list() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let stranger = app.sign_up().await?;
    let admin = app.sign_up_admin().await?;
    let plan_id = app.create_plan(&admin.token, 1_000).await?;
    let transaction_id = format!("txn_{}", Uuid::new_v4().simple());

    let payment = json!({
        "user_id": user.user_id,
        "plan_id": plan_id,
        "amount": "19.99",
        "status": "succeeded",
        "provider": "stripe",
        "transaction_id": transaction_id,
    });

    let res = app.client.post(app.url("/payments")).bearer_auth(&user.token).json(&payment).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["currency"], "USD");
    let payment_id = body["data"]["payment_id"].as_str().context("missing payment_id")?.to_string();

    let res = app.client.post(app.url("/payments")).bearer_auth(&user.token).json(&payment).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .get(app.url(&format!("/payments/user/{}", user.user_id)))
        .bearer_auth(&user.token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let body: Value = app
        .client
        .get(app.url(&format!("/payments/user/{}/status", user.user_id)))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["has_successful_payment"], true);

    let res = app
        .client
        .get(app.url(&format!("/payments/{}", payment_id)))
        .bearer_auth(&stranger.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app
        .client
        .get(app.url(&format!("/payments/user/{}", user.user_id)))
        .bearer_auth(&stranger.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .put(app.url(&format!("/payments/{}", payment_id)))
        .bearer_auth(&user.token)
        .json(&json!({ "status": "failed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .client
        .put(app.url(&format!("/payments/{}", payment_id)))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "failed" }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["transaction_id"], transaction_id.as_str());

    let body: Value = app
        .client
        .get(app.url(&format!("/payments/user/{}/status", user.user_id)))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["has_successful_payment"], false);
    Ok(())
}

#[tokio::test]
async fn api_keys_and_usage() -> Result<()> {
    let Some(app) = common::spawn_app().await? else { return Ok(()) };
    let user = app.sign_up().await?;
    let other = app.sign_up().await?;

    let res = app
        .client
        .post(app.url("/api-keys"))
        .bearer_auth(&user.token)
        .json(&json!({ "name": "ci" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["user_id"], user.user_id.to_string());
    let key = body["data"]["api_key"].as_str().context("missing api_key")?.to_string();
    assert_eq!(key.len(), 43);

    // Minting for someone else needs admin
    let res = app
        .client
        .post(app.url("/api-keys"))
        .bearer_auth(&user.token)
        .json(&json!({ "user_id": other.user_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.client.get(app.url(&format!("/api-keys/{}", key))).bearer_auth(&other.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.client.delete(app.url(&format!("/api-keys/{}", key))).bearer_auth(&user.token).send().await?;
    assert!(res.status().is_success());
    let res = app.client.get(app.url(&format!("/api-keys/{}", key))).bearer_auth(&user.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.client.get(app.url("/usage/my/usage")).bearer_auth(&user.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["chat_usage"], 0);
    assert_eq!(body["data"]["invoice_usage"], 0);
    Ok(())
}
