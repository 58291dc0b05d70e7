use axum::{extract::State, Json};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::warn;

use super::extract::{JsonBody, PathParam};
use super::{session_key, stored_user_id, ApiError, ApiResult, AppState};
use crate::engine::assessment::validate_quiz;
use crate::engine::difficulty::clamp_percentage;
use crate::engine::KnowledgeProfile;
use crate::system_prompt::PromptContext;
use crate::tutor::fallback_interest_analysis;

const CONNECTION_PROBE: &str = "Hello, are you working?";
const PROBE_SESSION: &str = "test";

/// Accepts `"Rust, Go"` or `["Rust", "Go"]`.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let items = match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(text)) => text.split(',').map(str::to_string).collect(),
        Some(OneOrMany::Many(items)) => items,
        None => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatContext {
    #[serde(deserialize_with = "string_or_list")]
    interests: Vec<String>,
    difficulty: Option<f64>,
    topic: Option<String>,
}

impl From<ChatContext> for PromptContext {
    fn from(context: ChatContext) -> Self {
        PromptContext {
            interests: context.interests,
            difficulty: context.difficulty.map(clamp_percentage),
            topic: context.topic.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    user_id: Option<Value>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    context: ChatContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    user_id: Option<Value>,
    topic: String,
    concept: String,
    difficulty_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRequest {
    user_id: Option<Value>,
    topic: String,
    concept: String,
    current_difficulty_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRequest {
    #[serde(default)]
    user_response: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    concept: String,
    correct_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterestRequest {
    #[serde(default)]
    interests: String,
    #[serde(default)]
    profile: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    user_answer: i64,
    correct_answer_index: i64,
    #[serde(default)]
    correct_answer_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    user_id: Option<Value>,
    #[serde(default, deserialize_with = "string_or_list")]
    interests: Vec<String>,
    #[serde(default)]
    knowledge_profile: KnowledgeProfile,
}

pub async fn test_connection(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let response = state
        .tutor
        .try_generate_response(CONNECTION_PROBE, PROBE_SESSION, &PromptContext::default())
        .await
        .map_err(|e| ApiError::upstream("AI service not available", e))?;
    Ok(Json(json!({ "success": true, "response": response })))
}

pub async fn generate_content(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ContentRequest>,
) -> ApiResult<Json<Value>> {
    let difficulty = state.difficulty_or_default(req.difficulty_percentage);
    let content = state
        .tutor
        .generate_learning_content(
            &session_key(req.user_id.as_ref()),
            &req.topic,
            &req.concept,
            difficulty,
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to generate AI content", e))?;
    Ok(Json(json!({ "success": true, "content": content })))
}

pub async fn analyze_response(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResponseRequest>,
) -> ApiResult<Json<Value>> {
    let analysis = state
        .tutor
        .analyze_user_response(
            &req.user_response,
            &req.topic,
            &req.concept,
            req.correct_answer.as_deref(),
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to analyze user response", e))?;
    Ok(Json(json!({ "success": true, "analysis": analysis })))
}

pub async fn analyze_interests(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<InterestRequest>,
) -> ApiResult<Json<Value>> {
    if req.interests.trim().is_empty() {
        return Err(ApiError::bad_request("Interests are required"));
    }
    let analysis = match state.tutor.analyze_interests(&req.interests, &req.profile).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Interest analysis unavailable, using fallback: {}", e);
            fallback_interest_analysis(&req.interests)
        }
    };
    Ok(Json(json!({ "success": true, "analysis": analysis })))
}

pub async fn chat(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ChatRequest>,
) -> ApiResult<Json<Value>> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }
    let user = session_key(req.user_id.as_ref());
    let context = PromptContext::from(req.context);
    let response = state.tutor.generate_response(&req.message, &user, &context).await;
    Ok(Json(json!({ "success": true, "response": response })))
}

pub async fn escalate_content(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EscalationRequest>,
) -> ApiResult<Json<Value>> {
    let profile = match stored_user_id(req.user_id.as_ref()) {
        Some(id) => state.db.run_blocking(move |db| db.knowledge_profile(id)).await?,
        None => KnowledgeProfile::default(),
    };
    let current = state.difficulty_or_default(req.current_difficulty_percentage);

    let content = state
        .tutor
        .generate_escalated_content(
            &session_key(req.user_id.as_ref()),
            &profile,
            &req.topic,
            &req.concept,
            current,
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to generate escalated content", e))?;
    Ok(Json(json!({ "success": true, "content": content })))
}

pub async fn validate_quiz_answer(JsonBody(req): JsonBody<QuizRequest>) -> Json<Value> {
    let verdict = validate_quiz(
        req.user_answer,
        req.correct_answer_index,
        &req.correct_answer_text,
    );
    Json(json!({
        "success": true,
        "isCorrect": verdict.is_correct,
        "feedback": verdict.feedback,
        "correctAnswer": verdict.correct_answer
    }))
}

pub async fn recommendations(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SuggestionRequest>,
) -> ApiResult<Json<Value>> {
    let recommendations = state
        .tutor
        .generate_recommendations(
            &session_key(req.user_id.as_ref()),
            &req.interests,
            &req.knowledge_profile,
        )
        .await
        .map_err(|e| ApiError::upstream("Failed to generate recommendations", e))?;
    Ok(Json(json!({ "success": true, "recommendations": recommendations })))
}

pub async fn memory_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "stats": state.tutor.memory().stats() }))
}

pub async fn clear_user_memory(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<String>,
) -> Json<Value> {
    state.tutor.memory().clear_user(&user_id);
    Json(json!({ "success": true, "message": format!("Cleared memory for user {}", user_id) }))
}

pub async fn clear_all_memory(State(state): State<AppState>) -> Json<Value> {
    state.tutor.memory().clear_all();
    Json(json!({ "success": true, "message": "Cleared all user memory" }))
}
