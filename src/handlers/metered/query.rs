use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::config;
use crate::database::dal::{ToolDal, UserDatabaseDal};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, MeteredUser};
use crate::services::agent::QueryAgent;
use crate::services::metering;
use crate::services::sql_tools::PgSqlTools;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub db_url: Option<String>,
    #[serde(default)]
    pub db_id: Option<Uuid>,
}

enum Target {
    Url(String),
    Saved(Uuid, String),
}

/// Exactly one of `db_url` or `db_id` names the database to query
async fn resolve_target(state: &AppState, user_id: Uuid, input: &ChatRequest) -> Result<Target, ApiError> {
    match (&input.db_url, input.db_id) {
        (Some(url), None) if !url.trim().is_empty() => Ok(Target::Url(url.clone())),
        (None, Some(db_id)) => {
            let db = UserDatabaseDal::new(state.db.clone()).get(db_id).await?;
            if db.user_id != user_id {
                return Err(ApiError::not_found("Database connection not found"));
            }
            let url = db
                .connection_url()
                .ok_or_else(|| ApiError::bad_request("Saved database connection is invalid"))?;
            Ok(Target::Saved(db_id, url))
        }
        _ => Err(ApiError::bad_request("Provide exactly one of db_url or db_id")),
    }
}

/// POST /api/v1/query/chat - answer a natural-language question from the caller's database
pub async fn chat(
    State(state): State<AppState>,
    Extension(caller): Extension<MeteredUser>,
    Json(input): Json<ChatRequest>,
) -> ApiResult<Value> {
    if input.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }

    let target = resolve_target(&state, caller.user_id, &input).await?;
    let url = match &target {
        Target::Url(url) | Target::Saved(_, url) => url.as_str(),
    };
    let pool = state.targets.target_pool(url).await?;
    if let Target::Saved(db_id, _) = target {
        UserDatabaseDal::new(state.db.clone()).mark_synced(db_id).await?;
    }

    let tools = ToolDal::new(state.db.clone()).list().await?;
    let sql = PgSqlTools::new(pool);
    let agent = QueryAgent::new(state.llm.as_ref(), &sql, config::config().agent.result_row_limit);
    let outcome = agent.run(&input.prompt, &tools).await?;

    let tokens_remaining = metering::charge(&state.db, caller.user_id, &outcome.token_usage).await?;

    Ok(ApiResponse::success(json!({
        "used_tool": outcome.used_tool,
        "sql_query": outcome.sql_query,
        "params": outcome.params,
        "result": outcome.result,
        "answer": outcome.answer,
        "token_usage": outcome.token_usage,
        "tokens_remaining": tokens_remaining,
    })))
}
