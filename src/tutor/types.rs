//! Structured records produced by the tutor.
//!
//! Every field is defaulted so a partially filled model reply still
//! deserializes; callers decide what counts as usable.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db::HistoryEntry;
use crate::engine::KnowledgeProfile;

/// Accepts `50`, `50.0`, `"50"` or `"50%"`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Index(i64),
    Text(String),
}

/// A single bite-sized lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// The lesson text, one or two sentences.
    #[serde(default)]
    pub content: String,
    /// One of "info", "quiz", "tip", "explanation" or "text_input".
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    /// Target difficulty as a percentage (0-100).
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<f64>,
    /// Quiz options, exactly four for quizzes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Index (0-3) of the correct option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_text: Option<String>,
    /// Keywords a free-text answer should mention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Lesson {
    pub fn info(content: impl Into<String>, difficulty: u8) -> Self {
        Self {
            content: content.into(),
            kind: "info".to_string(),
            difficulty: Some(f64::from(difficulty)),
            ..Self::default()
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.content.trim().is_empty() && !self.kind.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearningProportions {
    pub primary_focus: String,
    pub secondary_areas: Vec<String>,
    pub learning_ratio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterestSummary {
    pub overall_tone: String,
    pub confidence_level: f64,
    pub learning_style: String,
    pub learning_proportions: LearningProportions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterestCategory {
    pub name: String,
    pub topics: Vec<String>,
    pub difficulty: f64,
    pub confidence: f64,
    pub priority: String,
    pub proportion: f64,
    pub frequency: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearningSchedule {
    pub primary_focus: String,
    pub secondary_areas: String,
    pub balance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudyPlan {
    pub starting_point: String,
    pub learning_path: String,
    pub focus_areas: Vec<String>,
    pub learning_schedule: LearningSchedule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestAnalysis {
    pub analysis: InterestSummary,
    pub categories: Vec<InterestCategory>,
    pub recommendations: StudyPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseAnalysis {
    pub is_correct: bool,
    pub difficulty_level: f64,
    pub confidence: f64,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub adjusted_difficulty: f64,
}

impl Default for ResponseAnalysis {
    fn default() -> Self {
        Self {
            is_correct: true,
            difficulty_level: 50.0,
            confidence: 0.7,
            feedback: "Good response! Keep learning!".to_string(),
            suggestions: Vec::new(),
            adjusted_difficulty: 60.0,
        }
    }
}

/// One item of the personalized recommendation list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningSuggestion {
    pub topic: String,
    pub concept: String,
    /// 1-5 scale.
    pub difficulty: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameworkTopic {
    pub name: String,
    pub description: String,
    pub concepts: Vec<String>,
    pub difficulty: String,
    pub prerequisites: Vec<String>,
    pub learning_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicCategory {
    pub name: String,
    pub description: String,
    pub topics: Vec<FrameworkTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningPathPlan {
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopicStructure {
    pub categories: Vec<TopicCategory>,
    pub learning_paths: Vec<LearningPathPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recommendation {
    pub recommended_topic: String,
    pub recommended_concept: String,
    pub difficulty_level: String,
    pub reasoning: String,
    pub learning_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextDecision {
    pub should_learn: bool,
    pub reasoning: String,
    pub difficulty_adjustment: String,
    pub prerequisites: Vec<String>,
}

impl Default for ContextDecision {
    fn default() -> Self {
        Self {
            should_learn: true,
            reasoning: "Fallback decision".to_string(),
            difficulty_adjustment: "same".to_string(),
            prerequisites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub difficulty: u8,
    pub granularity: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            difficulty: 50,
            granularity: "auto".to_string(),
        }
    }
}

/// Everything the tutor knows about a learner when planning a lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Learner {
    pub interests: Vec<String>,
    pub knowledge_profile: KnowledgeProfile,
    pub learning_history: Vec<HistoryEntry>,
    pub preferences: Preferences,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_accepts_loose_model_output() {
        let lesson: Lesson = serde_json::from_str(
            r#"{"content": "Q?", "type": "quiz", "difficulty": "75%",
                "options": ["a", "b", "c", "d"], "correctAnswer": 2,
                "correctAnswerText": "c", "extra": true}"#,
        )
        .unwrap();
        assert_eq!(lesson.difficulty, Some(75.0));
        assert_eq!(lesson.correct_answer, Some(CorrectAnswer::Index(2)));
        assert!(lesson.is_usable());

        let text: Lesson =
            serde_json::from_str(r#"{"content": "x", "correctAnswer": "yes"}"#).unwrap();
        assert_eq!(text.correct_answer, Some(CorrectAnswer::Text("yes".into())));
        assert!(!text.is_usable());
    }

    #[test]
    fn test_lesson_serializes_type_key() {
        let json = serde_json::to_value(Lesson::info("hello", 40)).unwrap();
        assert_eq!(json["type"], "info");
        assert_eq!(json["difficulty"], 40.0);
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_partial_records_fill_defaults() {
        let analysis: ResponseAnalysis = serde_json::from_str(r#"{"isCorrect": false}"#).unwrap();
        assert!(!analysis.is_correct);
        assert_eq!(analysis.adjusted_difficulty, 60.0);

        let decision: ContextDecision = serde_json::from_str(r#"{"shouldLearn": false}"#).unwrap();
        assert!(!decision.should_learn);
        assert_eq!(decision.difficulty_adjustment, "same");
    }
}
