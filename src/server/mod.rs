//! HTTP API.

mod ai;
pub mod error;
mod extract;
mod learning;
mod users;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::engine::difficulty::clamp_percentage;
use crate::tutor::Tutor;

pub use error::{ApiError, ApiResult};

/// Memory key for requests that carry no user id.
const ANONYMOUS_SESSION: &str = "anonymous";

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tutor: Arc<Tutor>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, tutor: Tutor, config: Config) -> Self {
        Self {
            db,
            tutor: Arc::new(tutor),
            config: Arc::new(config),
        }
    }

    /// Requested percentage, or the configured default.
    fn difficulty_or_default(&self, requested: Option<f64>) -> u8 {
        requested
            .map(clamp_percentage)
            .unwrap_or(self.config.default_difficulty)
    }
}

/// Memory key for a loosely typed `userId` field.
fn session_key(user_id: Option<&Value>) -> String {
    match user_id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => ANONYMOUS_SESSION.to_string(),
    }
}

/// Database id carried by a loosely typed `userId` field, if any.
fn stored_user_id(user_id: Option<&Value>) -> Option<i64> {
    match user_id? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Accounts
        .route("/api/login", post(users::login))
        .route("/api/register-new", post(users::register_new))
        .route("/api/register", post(users::register))
        .route("/api/user/{user_id}", get(users::get_user).put(users::update_user))
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users/{user_id}", delete(users::delete_user))
        // Content, progress and knowledge
        .route("/api/content/{topic}", get(learning::content_for_topic))
        .route("/api/progress", post(learning::record_progress))
        .route("/api/progress/{user_id}", get(learning::progress_for_user))
        .route("/api/knowledge/update", post(learning::update_knowledge))
        .route("/api/knowledge/init", post(learning::init_concepts))
        .route("/api/knowledge/{user_id}", get(learning::knowledge_for_user))
        .route("/api/recommendations/{user_id}", get(learning::recommendations))
        .route("/api/assessment", post(learning::assessment))
        .route("/api/too-easy", post(learning::too_easy))
        .route("/api/analyze-text", post(learning::analyze_text))
        .route("/api/lesson/request", post(learning::request_lesson))
        // Tutor
        .route("/api/ai/test", get(ai::test_connection))
        .route("/api/ai/generate-content", post(ai::generate_content))
        .route("/api/ai/analyze-response", post(ai::analyze_response))
        .route("/api/ai/analyze-interests", post(ai::analyze_interests))
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/escalate-content", post(ai::escalate_content))
        .route("/api/ai/validate-quiz", post(ai::validate_quiz_answer))
        .route("/api/ai/recommendations", post(ai::recommendations))
        .route("/api/ai/memory/stats", get(ai::memory_stats))
        .route("/api/ai/memory/user/{user_id}", delete(ai::clear_user_memory))
        .route("/api/ai/memory/all", delete(ai::clear_all_memory))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MicroLearn server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, draining connections...");
}
