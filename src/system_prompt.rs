//! System prompt construction for tutor conversations.

use serde::Serialize;

use crate::engine::DifficultyLabel;

/// Learner details injected into the system prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptContext {
    pub interests: Vec<String>,
    pub difficulty: Option<u8>,
    pub topic: Option<String>,
}

impl PromptContext {
    pub fn topic(topic: impl Into<String>, difficulty: u8) -> Self {
        Self {
            interests: Vec::new(),
            difficulty: Some(difficulty),
            topic: Some(topic.into()),
        }
    }

    pub fn interests(interests: &[String]) -> Self {
        Self {
            interests: interests.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    fn level(&self) -> String {
        match self.difficulty {
            Some(p) => format!("{}% ({})", p, DifficultyLabel::from_percentage(p).description()),
            None => "Beginner".to_string(),
        }
    }
}

/// Build the tutor persona with the learner's context.
///
/// # Examples:
/// ```text
/// User Context:
/// - Interests: Rust, Cooking
/// - Learning Level: 50% (intermediate level)
/// - Current Topic: General
/// ```
pub fn build_tutor_system_prompt(context: &PromptContext) -> String {
    let interests = if context.interests.is_empty() {
        "Not specified".to_string()
    } else {
        context.interests.join(", ")
    };

    format!(
        "You are a personalized micro-learning AI assistant. You help users learn through bite-sized, interactive content.\n\
         \n\
         User Context:\n\
         - Interests: {}\n\
         - Learning Level: {}\n\
         - Current Topic: {}\n\
         \n\
         Guidelines:\n\
         - Keep responses concise and educational\n\
         - Ask engaging questions\n\
         - Provide actionable insights\n\
         - Adapt to user's knowledge level",
        interests,
        context.level(),
        context.topic.as_deref().unwrap_or("General"),
    )
}
