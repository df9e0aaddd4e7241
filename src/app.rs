use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::database::DatabaseManager;
use crate::handlers::{metered, protected, public};
use crate::middleware::{require_credentials, require_jwt};
use crate::services::invoice::InvoiceExtractor;
use crate::services::llm::{GeminiClient, LanguageModel};
use crate::services::speech::{ElevenLabsClient, SpeechClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pools for the caller-supplied databases the query agent reads
    pub targets: Arc<DatabaseManager>,
    pub llm: Arc<dyn LanguageModel>,
    pub speech: Arc<dyn SpeechClient>,
    pub invoice: Arc<InvoiceExtractor>,
}

impl AppState {
    /// Wire the production clients from the global config
    pub fn from_config(db: PgPool) -> Self {
        let config = config::config();
        Self {
            db,
            targets: Arc::new(DatabaseManager::new()),
            llm: Arc::new(GeminiClient::new(&config.llm)),
            speech: Arc::new(ElevenLabsClient::new(&config.speech)),
            invoice: Arc::new(InvoiceExtractor::new(&config.invoice)),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(metered_routes(state.clone()));

    let api_config = &config::config().api;
    let layers = ServiceBuilder::new()
        .layer(cors_layer())
        .layer(DefaultBodyLimit::max(api_config.max_request_size_bytes));

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(layers);

    let router = if api_config.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn public_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/users/sign-up", post(users::sign_up))
        .route("/users/sign-in", post(users::sign_in))
        .route("/users/refresh-token", post(users::refresh_token))
        .route("/users/send-otp", post(users::send_otp))
        .route("/users/verify-otp", post(users::verify_otp))
        .route("/users/password-reset/request", post(users::password_reset_request))
        .route("/users/password-reset/confirm", post(users::password_reset_confirm))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::*;

    Router::new()
        // Users
        .route("/users/logout", get(users::logout))
        .route("/users/me", get(users::me))
        .route("/users/all-users", get(users::all_users))
        .route("/users/by-email/:email", get(users::by_email))
        .route(
            "/users/:user_id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:user_id/change-role/:role_id", post(users::change_role))
        // Roles and plans
        .route("/roles", get(roles::list).post(roles::create))
        .route("/roles/:role_id", get(roles::get).put(roles::update).delete(roles::delete))
        .route("/plans", get(plans::list).post(plans::create))
        .route("/plans/:plan_id", get(plans::get).put(plans::update).delete(plans::delete))
        // Billing
        .route("/subscriptions", post(subscriptions::create))
        .route(
            "/subscriptions/user/:user_id",
            get(subscriptions::get_by_user).put(subscriptions::update_by_user),
        )
        .route("/payments", get(payments::list).post(payments::create))
        .route("/payments/user/:user_id", get(payments::list_by_user))
        .route("/payments/user/:user_id/status", get(payments::payment_status))
        .route(
            "/payments/:payment_id",
            get(payments::get).put(payments::update).delete(payments::delete),
        )
        .route("/api-keys", post(api_keys::create))
        .route("/api-keys/user/:user_id", get(api_keys::list_by_user))
        .route("/api-keys/:api_key", get(api_keys::get).delete(api_keys::revoke))
        .route("/usage", get(usage::list).post(usage::create))
        .route("/usage/my/usage", get(usage::my_usage))
        .route("/usage/user/:user_id", get(usage::get_by_user))
        .route("/usage/:usage_id", get(usage::get).put(usage::update).delete(usage::delete))
        .route("/purchase-quota", get(purchase_quota::list).post(purchase_quota::create))
        .route(
            "/purchase-quota/:quota_id",
            get(purchase_quota::get)
                .put(purchase_quota::update)
                .delete(purchase_quota::delete),
        )
        // Query agent configuration
        .route("/tools", get(tools::list).post(tools::create))
        .route("/tools/:tool_id", get(tools::get).put(tools::update).delete(tools::delete))
        .route("/databases", get(databases::list).post(databases::create))
        .route(
            "/databases/:db_id",
            get(databases::get).put(databases::update).delete(databases::delete),
        )
        // Speech and documents
        .route("/tts/tts", post(speech::text_to_speech))
        .route("/stt/stt", post(speech::speech_to_text))
        .route("/invoices/extract/invoice", post(invoices::extract_from_text))
        .route("/invoices/extract/pdf-image-text", post(invoices::extract_from_upload))
        .route_layer(middleware::from_fn_with_state(state, require_jwt))
}

fn metered_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/query/chat", post(metered::query::chat))
        .route_layer(middleware::from_fn_with_state(state, require_credentials))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Text2SQL API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Natural-language queries over your own databases, metered by subscription tokens",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "users": "/api/v1/users/sign-up, /sign-in, /refresh-token, /send-otp, /verify-otp, /password-reset/* (public)",
                "account": "/api/v1/users/*, /roles, /plans, /subscriptions, /payments, /api-keys, /usage (bearer token)",
                "agent": "/api/v1/tools, /databases (bearer token)",
                "speech": "/api/v1/tts/tts, /api/v1/stt/stt (bearer token)",
                "invoices": "/api/v1/invoices/extract/* (bearer token)",
                "query": "/api/v1/query/chat (X-API-Key or bearer token, metered)",
                "admin": "/api/v1/purchase-quota (admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            let detail = if crate::is_production!() { "unavailable".to_string() } else { e.to_string() };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": detail
                    }
                })),
            )
        }
    }
}
