use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::extract::{JsonBody, PathParam, QueryParams};
use super::{ApiError, ApiResult, AppState};
use crate::db::{ContentRecord, HistoryEntry, KnowledgeRow, NewContent};
use crate::engine::assessment::{analyze_text_input, static_escalation, Outcome, StaticEscalation};
use crate::engine::catalog::ConceptDef;
use crate::engine::difficulty::clamp_percentage;
use crate::tutor::types::CorrectAnswer;
use crate::tutor::{Learner, Lesson};

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    granularity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    user_id: i64,
    content_id: i64,
    #[serde(default)]
    completed: bool,
    score: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeRequest {
    user_id: i64,
    topic: String,
    concept: String,
    #[serde(default)]
    proficiency_level: i64,
    #[serde(default)]
    confidence_score: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConceptInit {
    topic: String,
    #[serde(default)]
    concepts: Vec<ConceptDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    user_id: i64,
    topic: String,
    concept: String,
    #[serde(default)]
    user_answer: Value,
    #[serde(default)]
    correct_answer: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooEasyRequest {
    user_id: i64,
    topic: String,
    concept: String,
    current_difficulty: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnswerRequest {
    user_id: i64,
    topic: String,
    concept: String,
    #[serde(default)]
    user_input: String,
    #[serde(default)]
    expected_answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    user_id: i64,
}

/// Harder follow-up served after "too easy".
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Escalation {
    Generated(Lesson),
    Canned(StaticEscalation),
}

fn require_subject(topic: &str, concept: &str) -> ApiResult<()> {
    if topic.trim().is_empty() || concept.trim().is_empty() {
        return Err(ApiError::bad_request("Topic and concept are required"));
    }
    Ok(())
}

pub async fn content_for_topic(
    State(state): State<AppState>,
    PathParam(topic): PathParam<String>,
    QueryParams(query): QueryParams<ContentQuery>,
) -> ApiResult<Json<Vec<ContentRecord>>> {
    let granularity = query.granularity.unwrap_or_else(|| "auto".to_string());
    let rows = state
        .db
        .run_blocking(move |db| db.content_for_topic(&topic, &granularity))
        .await?;
    Ok(Json(rows))
}

pub async fn record_progress(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProgressRequest>,
) -> ApiResult<Json<Value>> {
    let progress_id = state
        .db
        .run_blocking(move |db| {
            db.insert_progress(req.user_id, req.content_id, req.completed, req.score)
        })
        .await?;
    Ok(Json(json!({ "success": true, "progressId": progress_id })))
}

pub async fn progress_for_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let rows = state
        .db
        .run_blocking(move |db| db.progress_for_user(user_id, None))
        .await?;
    Ok(Json(rows))
}

pub async fn knowledge_for_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> ApiResult<Json<Vec<KnowledgeRow>>> {
    let rows = state.db.run_blocking(move |db| db.knowledge_rows(user_id)).await?;
    Ok(Json(rows))
}

pub async fn update_knowledge(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<KnowledgeRequest>,
) -> ApiResult<Json<Value>> {
    require_subject(&req.topic, &req.concept)?;
    let confidence = req.confidence_score.clamp(0.0, 1.0);
    let knowledge_id = state
        .db
        .run_blocking(move |db| {
            db.upsert_knowledge(
                req.user_id,
                &req.topic,
                &req.concept,
                req.proficiency_level,
                confidence,
            )
        })
        .await?;
    Ok(Json(json!({ "success": true, "knowledgeId": knowledge_id })))
}

pub async fn init_concepts(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ConceptInit>,
) -> ApiResult<Json<Value>> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::bad_request("Topic is required"));
    }
    let inserted = state
        .db
        .run_blocking(move |db| db.seed_concepts(&req.topic, &req.concepts))
        .await?;
    Ok(Json(json!({ "success": true, "inserted": inserted })))
}

pub async fn recommendations(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    QueryParams(query): QueryParams<TopicQuery>,
) -> ApiResult<Json<Value>> {
    let topic = query
        .topic
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Topic is required"))?;
    let concepts = state
        .db
        .run_blocking(move |db| db.recommend_concepts(user_id, &topic))
        .await?;
    Ok(Json(json!(concepts)))
}

pub async fn assessment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AssessmentRequest>,
) -> ApiResult<Json<Value>> {
    require_subject(&req.topic, &req.concept)?;
    // A missing answer never matches.
    let correct = !req.user_answer.is_null() && req.user_answer == req.correct_answer;
    let outcome = Outcome::quiz(correct);

    let update = state
        .db
        .run_blocking(move |db| db.record_outcome(req.user_id, &req.topic, &req.concept, &outcome))
        .await?;

    Ok(Json(json!({
        "success": true,
        "correct": correct,
        "knowledgeId": update.knowledge_id,
        "proficiencyLevel": update.proficiency_level,
        "confidenceScore": update.confidence_score
    })))
}

/// Mark a concept mastered and serve something harder, falling back to the
/// canned follow-ups and finally to a suggestion to move on.
pub async fn too_easy(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TooEasyRequest>,
) -> ApiResult<Json<Value>> {
    require_subject(&req.topic, &req.concept)?;
    let TooEasyRequest {
        user_id,
        topic,
        concept,
        current_difficulty,
    } = req;
    let current = state.difficulty_or_default(current_difficulty);

    let (update, profile) = {
        let (topic, concept) = (topic.clone(), concept.clone());
        state
            .db
            .run_blocking(move |db| {
                let update = db.record_outcome(user_id, &topic, &concept, &Outcome::mastered())?;
                Ok((update, db.knowledge_profile(user_id)?))
            })
            .await?
    };

    let escalation = match state
        .tutor
        .generate_escalated_content(&user_id.to_string(), &profile, &topic, &concept, current)
        .await
    {
        Ok(lesson) => Some(Escalation::Generated(lesson)),
        Err(e) => {
            warn!("Escalation for {} / {} failed, trying canned content: {}", topic, concept, e);
            static_escalation(&topic, &concept).map(Escalation::Canned)
        }
    };

    let body = match escalation {
        Some(content) => json!({
            "success": true,
            "escalated": true,
            "message": format!("Great! Let's try something more challenging in {}.", topic),
            "newContent": content,
            "knowledgeId": update.knowledge_id
        }),
        None => json!({
            "success": true,
            "escalated": false,
            "message": format!("You've mastered {} in {}! Let's explore a different area.", concept, topic),
            "knowledgeId": update.knowledge_id
        }),
    };
    Ok(Json(body))
}

pub async fn analyze_text(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TextAnswerRequest>,
) -> ApiResult<Json<Value>> {
    require_subject(&req.topic, &req.concept)?;
    let analysis = analyze_text_input(&req.user_input, &req.expected_answer, &req.topic);
    let outcome = Outcome::text(&analysis);

    state
        .db
        .run_blocking(move |db| db.record_outcome(req.user_id, &req.topic, &req.concept, &outcome))
        .await?;

    Ok(Json(json!({ "success": true, "analysis": analysis, "updated": true })))
}

/// Lesson as a content row, so progress can refer to it.
fn lesson_record(lesson: &Lesson, learner: &Learner) -> NewContent {
    let correct_answer = match &lesson.correct_answer {
        Some(CorrectAnswer::Index(i)) => Some(*i),
        Some(CorrectAnswer::Text(text)) => text
            .trim()
            .parse()
            .ok()
            .or_else(|| lesson.options.iter().position(|o| o == text).map(|i| i as i64)),
        None => None,
    };

    NewContent {
        topic: lesson
            .topic
            .clone()
            .or_else(|| learner.interests.first().cloned())
            .unwrap_or_else(|| "General".to_string()),
        concept: lesson.concept.clone(),
        content: lesson.content.clone(),
        kind: lesson.kind.clone(),
        granularity: learner.preferences.granularity.clone(),
        difficulty: lesson
            .difficulty
            .map(clamp_percentage)
            .unwrap_or(learner.preferences.difficulty),
        options: lesson.options.clone(),
        correct_answer,
    }
}

pub async fn request_lesson(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LessonRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = req.user_id;
    let default_difficulty = state.config.default_difficulty;
    let view = state
        .db
        .run_blocking(move |db| db.load_learner(user_id, default_difficulty))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let learner = view.learner;
    if learner.interests.is_empty() {
        return Err(ApiError::bad_request(
            "User has no learning interests. Please add interests in settings first.",
        ));
    }

    let lesson = state
        .tutor
        .generate_personalized_lesson(&user_id.to_string(), &learner)
        .await
        .map_err(|e| ApiError::upstream("Failed to generate lesson", e))?;

    let record = lesson_record(&lesson, &learner);
    let content_id = state.db.run_blocking(move |db| db.insert_content(&record)).await?;
    info!("Served lesson {} to user {}", content_id, user_id);

    Ok(Json(json!({ "success": true, "lesson": lesson, "contentId": content_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_record_resolves_text_answers() {
        let learner = Learner {
            interests: vec!["Chess".to_string()],
            ..Learner::default()
        };
        let lesson = Lesson {
            content: "Which piece moves diagonally?".into(),
            kind: "quiz".into(),
            options: vec!["Rook".into(), "Bishop".into()],
            correct_answer: Some(CorrectAnswer::Text("Bishop".into())),
            ..Lesson::default()
        };

        let record = lesson_record(&lesson, &learner);
        assert_eq!(record.topic, "Chess");
        assert_eq!(record.correct_answer, Some(1));
        assert_eq!(record.difficulty, 50);
        assert_eq!(record.granularity, "auto");
    }
}
