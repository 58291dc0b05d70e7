use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::extract::{JsonBody, PathParam};
use super::{ApiError, ApiResult, AppState};
use crate::db::UserUpdate;

const DEFAULT_FREQUENCY: i64 = 3;
const DEFAULT_GRANULARITY: &str = "auto";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
}

impl Credentials {
    fn validated(self) -> ApiResult<(String, String)> {
        let email = self.email.trim().to_string();
        let name = self.name.trim().to_string();
        if email.is_empty() || name.is_empty() {
            return Err(ApiError::bad_request("Email and name are required"));
        }
        Ok((email, name))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    user_id: Option<i64>,
    #[serde(default)]
    interests: Vec<String>,
    frequency: Option<i64>,
    granularity: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Credentials>,
) -> ApiResult<Json<Value>> {
    let (email, _) = req.validated()?;
    let user = state
        .db
        .run_blocking(move |db| db.find_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found. Please register first."))?;

    Ok(Json(json!({
        "success": true,
        "userId": user.id,
        "isNewUser": false,
        "message": "Login successful"
    })))
}

pub async fn register_new(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<Credentials>,
) -> ApiResult<Json<Value>> {
    let (email, name) = req.validated()?;

    let created = state
        .db
        .run_blocking(move |db| {
            if db.find_user_by_email(&email)?.is_some() {
                return Ok(None);
            }
            db.create_user(&email, &name).map(Some)
        })
        .await?;
    let user_id = created
        .ok_or_else(|| ApiError::Conflict("User already exists. Please login instead.".into()))?;

    info!("Registered new user {}", user_id);
    Ok(Json(json!({
        "success": true,
        "userId": user_id,
        "message": "User registered successfully"
    })))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SetupRequest>,
) -> ApiResult<Json<Value>> {
    let interests: Vec<String> = req
        .interests
        .iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    let user_id = match req.user_id {
        Some(id) if !interests.is_empty() => id,
        _ => return Err(ApiError::bad_request("User ID and interests are required")),
    };
    let frequency = req.frequency.unwrap_or(DEFAULT_FREQUENCY);
    let granularity = req.granularity.unwrap_or_else(|| DEFAULT_GRANULARITY.to_string());

    let changed = state
        .db
        .run_blocking(move |db| db.register_interests(user_id, &interests, frequency, &granularity))
        .await?;
    if changed == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(json!({
        "success": true,
        "userId": user_id,
        "message": "User setup completed successfully"
    })))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> ApiResult<Json<Value>> {
    let default_difficulty = state.config.default_difficulty;
    let user = state
        .db
        .run_blocking(move |db| db.load_learner(user_id, default_difficulty))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn update_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> ApiResult<Json<Value>> {
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let changed = state
        .db
        .run_blocking(move |db| db.update_user(user_id, &update))
        .await?;
    if changed == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(json!({ "success": true, "message": "User updated successfully" })))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let users = state.db.run_blocking(|db| db.list_users()).await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(raw_id): PathParam<String>,
) -> ApiResult<Json<Value>> {
    let user_id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    let deleted = state.db.run_blocking(move |db| db.delete_user(user_id)).await?;
    state.tutor.memory().clear_user(&user_id.to_string());
    if !deleted.user_deleted {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully deleted user {}", user_id),
        "deletedKnowledge": deleted.deleted_knowledge,
        "deletedProgress": deleted.deleted_progress
    })))
}
