use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub agent: AgentConfig,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub invoice: InvoiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Pool size for each cached target database used by the query agent
    pub target_max_connections: u32,
    /// Seconds to wait for a target database before giving up
    pub target_connection_timeout: u64,
    /// Distinct target databases kept open at once
    pub target_pool_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub otp_expiry_minutes: i64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Subscription balance a caller needs before a metered query is accepted
    pub min_tokens_required: i64,
    /// Rows returned from the target database per query
    pub result_row_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(skip_serializing)]
    pub elevenlabs_api_key: String,
    pub base_url: String,
    pub voice_id: String,
    pub tts_model_id: String,
    pub output_format: String,
    pub stt_model_id: String,
    pub language_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceConfig {
    #[serde(skip_serializing)]
    pub groq_api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_TARGET_MAX_CONNECTIONS") {
            self.database.target_max_connections =
                v.parse().unwrap_or(self.database.target_max_connections);
        }
        if let Ok(v) = env::var("DATABASE_TARGET_CONNECTION_TIMEOUT") {
            self.database.target_connection_timeout =
                v.parse().unwrap_or(self.database.target_connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_TARGET_POOL_LIMIT") {
            self.database.target_pool_limit = v.parse().unwrap_or(self.database.target_pool_limit);
        }

        // API overrides
        if let Some(v) = env::var("API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRY_MINUTES") {
            self.security.access_token_expiry_minutes =
                v.parse().unwrap_or(self.security.access_token_expiry_minutes);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_EXPIRY_DAYS") {
            self.security.refresh_token_expiry_days =
                v.parse().unwrap_or(self.security.refresh_token_expiry_days);
        }
        if let Ok(v) = env::var("OTP_EXPIRY_MINUTES") {
            self.security.otp_expiry_minutes = v.parse().unwrap_or(self.security.otp_expiry_minutes);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Agent overrides
        if let Ok(v) = env::var("AGENT_MIN_TOKENS_REQUIRED") {
            self.agent.min_tokens_required = v.parse().unwrap_or(self.agent.min_tokens_required);
        }
        if let Ok(v) = env::var("AGENT_RESULT_ROW_LIMIT") {
            self.agent.result_row_limit = v.parse().unwrap_or(self.agent.result_row_limit);
        }

        // Third-party overrides
        if let Ok(v) = env::var("GEMINI_API_KEY") {
            self.llm.gemini_api_key = v;
        }
        if let Ok(v) = env::var("GEMINI_MODEL") {
            self.llm.gemini_model = v;
        }
        if let Ok(v) = env::var("GEMINI_BASE_URL") {
            self.llm.gemini_base_url = v;
        }
        if let Ok(v) = env::var("ELEVENLABS_API_KEY") {
            self.speech.elevenlabs_api_key = v;
        }
        if let Ok(v) = env::var("ELEVENLABS_BASE_URL") {
            self.speech.base_url = v;
        }
        if let Ok(v) = env::var("ELEVENLABS_VOICE_ID") {
            self.speech.voice_id = v;
        }
        if let Ok(v) = env::var("GROQ_API_KEY") {
            self.invoice.groq_api_key = v;
        }
        if let Ok(v) = env::var("GROQ_BASE_URL") {
            self.invoice.base_url = v;
        }
        if let Ok(v) = env::var("GROQ_MODEL") {
            self.invoice.vision_model = v.clone();
            self.invoice.text_model = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                target_max_connections: 2,
                target_connection_timeout: 10,
                target_pool_limit: 16,
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
                max_request_size_bytes: 25 * 1024 * 1024, // 25MB, audio uploads
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                access_token_expiry_minutes: 60 * 24,
                refresh_token_expiry_days: 2,
                otp_expiry_minutes: 10,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            agent: AgentConfig::default(),
            llm: LlmConfig::default(),
            speech: SpeechConfig::default(),
            invoice: InvoiceConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                target_max_connections: 4,
                target_connection_timeout: 10,
                target_pool_limit: 64,
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
                max_request_size_bytes: 20 * 1024 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_token_expiry_minutes: 60,
                refresh_token_expiry_days: 2,
                otp_expiry_minutes: 10,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            agent: AgentConfig::default(),
            llm: LlmConfig::default(),
            speech: SpeechConfig::default(),
            invoice: InvoiceConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                target_max_connections: 4,
                target_connection_timeout: 10,
                target_pool_limit: 64,
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: false,
                max_request_size_bytes: 20 * 1024 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_token_expiry_minutes: 30,
                refresh_token_expiry_days: 2,
                otp_expiry_minutes: 10,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            agent: AgentConfig::default(),
            llm: LlmConfig::default(),
            speech: SpeechConfig::default(),
            invoice: InvoiceConfig::default(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            min_tokens_required: 5000,
            result_row_limit: 10,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: String::new(),
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "EXAVITQu4vr4xnSDxMaL".to_string(),
            tts_model_id: "eleven_flash_v2_5".to_string(),
            output_format: "mp3_44100_128".to_string(),
            stt_model_id: "scribe_v1".to_string(),
            language_code: "eng".to_string(),
        }
    }
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            text_model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            vision_model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.agent.min_tokens_required, 5000);
        assert_eq!(config.agent.result_row_limit, 10);
        assert_eq!(config.security.otp_expiry_minutes, 10);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        // Production refuses to sign tokens until JWT_SECRET is provided
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.access_token_expiry_minutes < 60 * 24);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn test_third_party_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.llm.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.speech.stt_model_id, "scribe_v1");
        assert!(config.invoice.base_url.ends_with("/openai/v1"));
    }

    #[test]
    fn secrets_are_not_serialized() {
        let value = serde_json::to_value(AppConfig::development()).unwrap();
        assert!(value["security"].get("jwt_secret").is_none());
        assert!(value["llm"].get("gemini_api_key").is_none());
    }
}
