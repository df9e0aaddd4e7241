//! Text-to-SQL orchestration: schema discovery, tool selection or SQL
//! generation, execution, and a natural-language summary of the rows.

use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::database::models::tool::Tool;
use crate::database::DatabaseError;
use crate::services::llm::{LanguageModel, LlmError, TokenUsage};
use crate::services::sql_tools::{ColumnInfo, SqlDatabase, SqlToolsError};

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```sql\s*|```").expect("valid fence pattern"));
static SELECT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bselect\b").expect("valid select pattern"));

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Generated content is not a SELECT query.")]
    NotSelect,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    Schema(String),

    #[error("Failed to get response from LLM")]
    EmptyResponse,
}

impl From<SqlToolsError> for AgentError {
    fn from(err: SqlToolsError) -> Self {
        match err {
            SqlToolsError::Schema(_) => AgentError::Schema(err.to_string()),
            SqlToolsError::Query(_) => AgentError::Query(err.to_string()),
        }
    }
}

/// Result of one natural-language query
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub used_tool: Option<String>,
    pub sql_query: String,
    pub params: Option<Value>,
    pub result: Value,
    pub answer: String,
    pub token_usage: TokenUsage,
}

/// Tool choice parsed from the selection reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub used_tool: Option<String>,
    pub sql_query: Option<Value>,
    pub params: Option<Value>,
}

/// Remove ```sql / ``` fences and surrounding whitespace
pub fn clean_sql(text: &str) -> String {
    FENCE.replace_all(text.trim(), "").trim().to_string()
}

pub fn is_select(sql: &str) -> bool {
    SELECT_WORD.is_match(sql)
}

/// Parse the tool-selection reply; anything unparsable means no tool
pub fn parse_selection(text: &str) -> Selection {
    let cleaned = FENCE.replace_all(text.trim(), "");
    let cleaned = cleaned.trim().trim_start_matches("json").trim();

    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) else {
        return Selection::default();
    };

    let used_tool = match map.get("used_tool") {
        Some(Value::String(name)) if !name.trim().is_empty() && !name.eq_ignore_ascii_case("none") => {
            Some(name.clone())
        }
        _ => None,
    };
    let non_null = |key: &str| map.get(key).filter(|v| !v.is_null()).cloned();

    Selection {
        used_tool,
        sql_query: non_null("sql_query"),
        params: non_null("params"),
    }
}

pub fn format_schema(schema: &[(String, Vec<ColumnInfo>)]) -> String {
    schema
        .iter()
        .map(|(table, columns)| {
            let columns = serde_json::to_string(columns).unwrap_or_else(|_| "[]".to_string());
            format!("Table: {}\nColumns: {}", table, columns)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn selection_prompt(tools: &[Tool], schema: &str, query: &str) -> String {
    let tool_list = tools
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "Tool {}:\nName: {}\nDescription: {}\nSQL Template: {}",
                i + 1,
                t.name,
                t.description.as_deref().unwrap_or(""),
                t.sql_template.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert SQL assistant. Here are some tools, each with a name, description, and SQL template \
         (with placeholders in curly braces):\n\n\
         {tool_list}\n\n\
         Database schema:\n{schema}\n\n\
         User Query: {query}\n\n\
         Instructions:\n\
         - Select the best tool for the user query (or 'none' if none match).\n\
         - If a tool is selected, extract the values for each placeholder from the user query or Database schema, \
         fill the SQL template, and return the filled SQL.\n\
         - Respond in JSON: {{\"used_tool\": <tool name or null>, \"sql_query\": <filled SQL or null>, \
         \"params\": <dict of extracted params or null>}}"
    )
}

pub fn generation_prompt(schema: &str, query: &str) -> String {
    format!(
        "Database schema:\n{schema}\n\n\
         User prompt: {query}\n\
         Write a SQL query for the above prompt using the schema."
    )
}

pub fn summary_prompt(query: &str, sql: &str, rows: &Value) -> String {
    format!(
        "User question: {query}\n\n\
         SQL query that was run:\n{sql}\n\n\
         Query result (JSON rows):\n{rows}\n\n\
         Answer the user's question in plain language using only the query result. \
         If the result is empty, say that no matching data was found. Do not include SQL in the answer."
    )
}

pub struct QueryAgent<'a> {
    llm: &'a dyn LanguageModel,
    db: &'a dyn SqlDatabase,
    row_limit: i64,
}

impl<'a> QueryAgent<'a> {
    pub fn new(llm: &'a dyn LanguageModel, db: &'a dyn SqlDatabase, row_limit: i64) -> Self {
        Self { llm, db, row_limit }
    }

    pub async fn run(&self, prompt: &str, tools: &[Tool]) -> Result<QueryOutcome, AgentError> {
        let mut usage = TokenUsage::default();

        let schema = self.discover_schema().await?;
        let schema_str = format_schema(&schema);
        tracing::debug!("Discovered {} tables", schema.len());

        let reply = self.call(&selection_prompt(tools, &schema_str, prompt), &mut usage).await?;
        let selection = parse_selection(&reply);

        let (used_tool, sql_query, params) = match (selection.used_tool, selection.sql_query) {
            (Some(tool), Some(Value::String(sql))) => {
                tracing::debug!("Tool selected: {}", tool);
                (Some(tool), sql, selection.params)
            }
            _ => {
                tracing::debug!("No tool matched, generating SQL");
                let generated = self.call(&generation_prompt(&schema_str, prompt), &mut usage).await?;
                let sql = clean_sql(&generated);
                if !is_select(&sql) {
                    return Err(AgentError::NotSelect);
                }
                (None, sql, None)
            }
        };

        tracing::debug!("Running SQL: {}", sql_query);
        let result = self.db.run_query(&sql_query, self.row_limit).await?;

        let answer = self.call(&summary_prompt(prompt, &sql_query, &result), &mut usage).await?;

        Ok(QueryOutcome {
            used_tool,
            sql_query,
            params,
            result,
            answer: answer.trim().to_string(),
            token_usage: usage,
        })
    }

    async fn discover_schema(&self) -> Result<Vec<(String, Vec<ColumnInfo>)>, AgentError> {
        let tables = self.db.list_tables().await?;
        let described = try_join_all(tables.iter().map(|t| self.db.describe_table(t))).await?;
        Ok(tables.into_iter().zip(described).collect())
    }

    /// One model call; usage the provider did not report is estimated from the prompt
    async fn call(&self, prompt: &str, usage: &mut TokenUsage) -> Result<String, AgentError> {
        let completion = self.llm.generate(prompt).await?;

        match completion.usage {
            Some(reported) => *usage += reported,
            None => match self.llm.count_tokens(prompt).await {
                Ok(estimated) => *usage += TokenUsage::new(estimated, 0),
                Err(e) => tracing::warn!("Token usage estimation failed: {}", e),
            },
        }

        let content = completion.content.trim().to_string();
        if content.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(content)
    }
}
