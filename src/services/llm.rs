use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::config::LlmConfig;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Tokens billed for one or more model calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: TokenUsage) {
        *self = *self + other;
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    /// Usage as reported by the provider, when it reports any
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError>;

    async fn count_tokens(&self, prompt: &str) -> Result<u64, LlmError>;
}

/// Gemini `generateContent` over REST
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    total_token_count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: u64,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn request(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: [Content { role: "user", parts: [Part { text: prompt }] }],
        }
    }

    fn ensure_configured(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured);
        }
        Ok(())
    }
}

impl GenerateResponse {
    fn into_completion(self) -> Result<Completion, LlmError> {
        let content: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let usage = self.usage_metadata.map(|u| {
            let mut usage = TokenUsage::new(u.prompt_token_count, u.candidates_token_count);
            if let Some(total) = u.total_token_count {
                usage.total_tokens = total;
            }
            usage
        });

        Ok(Completion { content, usage })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.ensure_configured()?;
        let response = self
            .http
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request(prompt))
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        response.into_completion()
    }

    async fn count_tokens(&self, prompt: &str) -> Result<u64, LlmError> {
        self.ensure_configured()?;
        let response = self
            .http
            .post(self.endpoint("countTokens"))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request(prompt))
            .send()
            .await?
            .error_for_status()?
            .json::<CountTokensResponse>()
            .await?;

        Ok(response.total_tokens)
    }
}
