#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use text2sql_api::config::InvoiceConfig;
use text2sql_api::database::DatabaseManager;
use text2sql_api::services::invoice::InvoiceExtractor;
use text2sql_api::services::llm::{Completion, LanguageModel, LlmError, TokenUsage};
use text2sql_api::services::speech::{SpeechClient, SpeechError};
use text2sql_api::AppState;

pub const ADMIN_ROLE_ID: &str = "00000000-0000-4000-8000-000000000002";

/// Usage the fake model reports for every call
pub const CALL_USAGE: (u64, u64) = (100, 20);

/// Answers each agent step by recognizing its prompt
pub struct FakeModel;

#[async_trait]
impl LanguageModel for FakeModel {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let content = if prompt.contains("Select the best tool") {
            r#"{"used_tool": null, "sql_query": null, "params": null}"#
        } else if prompt.contains("Write a SQL query") {
            "```sql\nSELECT 1 AS one;\n```"
        } else {
            "There is exactly one row and its value is 1."
        };
        Ok(Completion {
            content: content.to_string(),
            usage: Some(TokenUsage::new(CALL_USAGE.0, CALL_USAGE.1)),
        })
    }

    async fn count_tokens(&self, _prompt: &str) -> Result<u64, LlmError> {
        Ok(0)
    }
}

pub struct FakeSpeech;

#[async_trait]
impl SpeechClient for FakeSpeech {
    async fn text_to_speech(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
        Ok(b"ID3fake-mp3".to_vec())
    }

    async fn speech_to_text(&self, _audio: Vec<u8>, _filename: &str) -> Result<String, SpeechError> {
        Ok("hello world".to_string())
    }
}

pub struct TestApp {
    pub base_url: String,
    pub pool: PgPool,
    pub client: reqwest::Client,
}

/// Serve the router in-process on an ephemeral port. Returns `None` when
/// no DATABASE_URL is configured so database-backed tests can skip.
pub async fn spawn_app() -> Result<Option<TestApp>> {
    let _ = dotenvy::dotenv();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return Ok(None);
    };

    let pool = PgPool::connect(&database_url).await.context("failed to connect DATABASE_URL")?;
    DatabaseManager::migrate(&pool).await?;

    let state = AppState {
        db: pool.clone(),
        targets: Arc::new(DatabaseManager::with_limit(4)),
        llm: Arc::new(FakeModel),
        speech: Arc::new(FakeSpeech),
        invoice: Arc::new(InvoiceExtractor::new(&InvoiceConfig::default())),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let app = text2sql_api::app(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(Some(TestApp {
        base_url,
        pool,
        client: reqwest::Client::new(),
    }))
}

pub struct SignedUp {
    pub user_id: Uuid,
    pub email: String,
    pub password: String,
    pub token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Register a fresh user with a unique e-mail
    pub async fn sign_up(&self) -> Result<SignedUp> {
        let email = format!("test-{}@example.com", Uuid::new_v4().simple());
        let password = "correct horse battery staple".to_string();

        let res = self
            .client
            .post(self.url("/users/sign-up"))
            .json(&json!({
                "email": email,
                "first_name": "Test",
                "last_name": "User",
                "password": password,
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED, "sign-up failed");

        let body: Value = res.json().await?;
        let user_id = body["data"]["user"]["user_id"]
            .as_str()
            .context("missing user_id")?
            .parse()?;
        let token = body["data"]["token"].as_str().context("missing token")?.to_string();

        Ok(SignedUp { user_id, email, password, token })
    }

    /// Register a user and grant it the admin role directly in the database
    pub async fn sign_up_admin(&self) -> Result<SignedUp> {
        let user = self.sign_up().await?;
        sqlx::query("UPDATE users SET role_id = $1 WHERE user_id = $2")
            .bind(Uuid::parse_str(ADMIN_ROLE_ID)?)
            .bind(user.user_id)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn create_plan(&self, admin_token: &str, tokens: i64) -> Result<Uuid> {
        let res = self
            .client
            .post(self.url("/plans"))
            .bearer_auth(admin_token)
            .json(&json!({
                "title": format!("Plan {}", Uuid::new_v4().simple()),
                "monthly_price": 9.99,
                "yearly_price": 99.0,
                "price_id": "price_test",
                "features": ["chat"],
                "tokens": tokens,
            }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED, "plan create failed");
        let body: Value = res.json().await?;
        Ok(body["data"]["plan_id"].as_str().context("missing plan_id")?.parse()?)
    }

    pub async fn subscribe(&self, token: &str, user_id: Uuid, plan_id: Uuid) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/subscriptions"))
            .bearer_auth(token)
            .json(&json!({ "user_id": user_id, "plan_id": plan_id }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED, "subscribe failed");
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}
