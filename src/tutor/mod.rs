//! Model-backed tutoring operations.
//!
//! Every structured operation follows the same shape: build a prompt, run it
//! through the learner's conversation, pull JSON out of the reply and fall back
//! to a fixed record when the reply cannot be used. Transport failures are
//! returned as errors so callers can choose their own fallback.

pub mod framework;
pub mod prompts;
pub mod types;

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::context::ConversationContext;
use crate::engine::catalog::ConceptCatalog;
use crate::engine::difficulty::escalate;
use crate::engine::hierarchy;
use crate::engine::profile::learning_approach;
use crate::engine::KnowledgeProfile;
use crate::llm::response::{parse_json, strip_reasoning};
use crate::llm::ChatBackend;
use crate::memory::ConversationMemory;
use crate::system_prompt::PromptContext;

pub use framework::TopicFramework;
pub use types::{
    ContextDecision, InterestAnalysis, Learner, LearningSuggestion, Lesson, Recommendation,
    ResponseAnalysis, TopicStructure,
};

/// Memory key shared by analysis calls that are not tied to one learner.
pub const SYSTEM_SESSION: &str = "system";

pub const CONNECTION_TROUBLE: &str =
    "I'm having trouble connecting to the AI service. Please try again later.";
const LESSON_TROUBLE: &str = "I'm having trouble generating a lesson right now. Please try again.";
const MAX_FALLBACK_INTERESTS: usize = 5;

/// A model backend paired with the memory its exchanges are recorded in.
#[derive(Clone)]
pub struct Conversation {
    backend: Arc<dyn ChatBackend>,
    memory: Arc<ConversationMemory>,
}

impl Conversation {
    pub fn new(backend: Arc<dyn ChatBackend>, memory: Arc<ConversationMemory>) -> Self {
        Self { backend, memory }
    }

    pub async fn try_respond(
        &self,
        prompt: &str,
        user_id: &str,
        context: &PromptContext,
    ) -> anyhow::Result<String> {
        let messages = ConversationContext::build_messages(&self.memory, user_id, context, prompt);
        debug!("Sending {} messages for user {}", messages.len(), user_id);

        let reply = self.backend.chat(messages).await?;
        let cleaned = strip_reasoning(&reply);
        self.memory.record_exchange(user_id, prompt, &cleaned);
        Ok(cleaned)
    }
}

pub struct Tutor {
    conversation: Conversation,
    framework: TopicFramework,
    catalog: ConceptCatalog,
}

impl Tutor {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        memory: Arc<ConversationMemory>,
        config: &Config,
    ) -> Self {
        let conversation = Conversation::new(backend, memory);
        Self {
            framework: TopicFramework::new(conversation.clone(), config.topic_cache_size),
            conversation,
            catalog: config.concepts.clone(),
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.conversation.memory
    }

    pub fn framework(&self) -> &TopicFramework {
        &self.framework
    }

    pub async fn try_generate_response(
        &self,
        prompt: &str,
        user_id: &str,
        context: &PromptContext,
    ) -> anyhow::Result<String> {
        self.conversation.try_respond(prompt, user_id, context).await
    }

    /// Like [`Tutor::try_generate_response`] but answers with an apology
    /// instead of an error.
    pub async fn generate_response(
        &self,
        prompt: &str,
        user_id: &str,
        context: &PromptContext,
    ) -> String {
        match self.try_generate_response(prompt, user_id, context).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("AI service error: {}", e);
                CONNECTION_TROUBLE.to_string()
            }
        }
    }

    pub async fn analyze_interests(
        &self,
        raw_input: &str,
        profile: &serde_json::Value,
    ) -> anyhow::Result<InterestAnalysis> {
        let prompt = prompts::interest_analysis(raw_input, profile);
        let context = PromptContext {
            interests: vec![raw_input.to_string()],
            ..PromptContext::default()
        };
        let reply = self.try_generate_response(&prompt, SYSTEM_SESSION, &context).await?;

        Ok(parse_json(&reply).unwrap_or_else(|| {
            warn!("Failed to parse AI interest analysis, using fallback");
            debug!("AI response was: {}", reply);
            fallback_interest_analysis(raw_input)
        }))
    }

    pub async fn generate_learning_content(
        &self,
        user_id: &str,
        topic: &str,
        concept: &str,
        difficulty: u8,
    ) -> anyhow::Result<Lesson> {
        let prompt = prompts::learning_content(topic, concept, difficulty);
        let reply = self
            .try_generate_response(&prompt, user_id, &PromptContext::topic(topic, difficulty))
            .await?;

        Ok(parse_json::<Lesson>(&reply)
            .filter(Lesson::is_usable)
            .unwrap_or_else(|| Lesson::info(reply, difficulty)))
    }

    pub async fn analyze_user_response(
        &self,
        answer: &str,
        topic: &str,
        concept: &str,
        correct_answer: Option<&str>,
    ) -> anyhow::Result<ResponseAnalysis> {
        let prompt = prompts::response_analysis(answer, topic, concept, correct_answer);
        let reply = self
            .try_generate_response(&prompt, SYSTEM_SESSION, &PromptContext::default())
            .await?;

        Ok(parse_json(&reply).unwrap_or_default())
    }

    pub async fn generate_escalated_content(
        &self,
        user_id: &str,
        profile: &KnowledgeProfile,
        topic: &str,
        concept: &str,
        current: u8,
    ) -> anyhow::Result<Lesson> {
        let escalated = escalate(current);
        let interests = vec![topic.to_string()];
        let learner = Learner {
            interests: interests.clone(),
            knowledge_profile: profile.clone(),
            ..Learner::default()
        };

        let recommendation = self
            .framework
            .recommended_content(&learner, &interests, Some(topic))
            .await;
        let hierarchy = hierarchy::recommend(profile, topic, concept);

        let prompt = prompts::escalation(&prompts::EscalationBrief {
            topic,
            concept,
            current,
            escalated,
            recommendation: &recommendation,
            hierarchy: &hierarchy,
        });
        let reply = self
            .try_generate_response(&prompt, user_id, &PromptContext::topic(topic, escalated))
            .await?;

        let lesson = match parse_json::<Lesson>(&reply).filter(Lesson::is_usable) {
            Some(mut lesson) => {
                lesson.difficulty.get_or_insert(f64::from(escalated));
                lesson
            }
            None => Lesson {
                topic: Some(topic.to_string()),
                concept: Some(format!("Advanced {}", concept)),
                reasoning: Some("Escalated content for advanced learners".to_string()),
                ..Lesson::info(reply, escalated)
            },
        };
        Ok(lesson)
    }

    pub async fn generate_recommendations(
        &self,
        user_id: &str,
        interests: &[String],
        profile: &KnowledgeProfile,
    ) -> anyhow::Result<Vec<LearningSuggestion>> {
        let prompt = prompts::recommendations(interests, profile);
        let reply = self
            .try_generate_response(&prompt, user_id, &PromptContext::interests(interests))
            .await?;

        Ok(parse_json(&reply).unwrap_or_default())
    }

    /// Plan and generate the next lesson from stored learner data.
    pub async fn generate_personalized_lesson(
        &self,
        user_id: &str,
        learner: &Learner,
    ) -> anyhow::Result<Lesson> {
        let interests = &learner.interests;
        if interests.is_empty() {
            anyhow::bail!("User has no learning interests. Please add interests in settings first.");
        }
        info!(
            "Planning lesson for user {} ({} interests, {} known concepts)",
            user_id,
            interests.len(),
            learner.knowledge_profile.iter().count()
        );

        let recommendation = self.framework.recommended_content(learner, interests, None).await;
        let concept = if recommendation.recommended_concept.trim().is_empty() {
            "basics"
        } else {
            recommendation.recommended_concept.as_str()
        };
        let decision = self
            .framework
            .should_learn_in_new_context(learner, concept, "new context")
            .await;

        let profile = &learner.knowledge_profile;
        let approach = learning_approach(profile, &recommendation.recommended_topic, concept);
        let related = hierarchy::next_learning_path(profile);
        let ready: Vec<String> = interests
            .iter()
            .flat_map(|topic| {
                let known = profile.known_concepts(topic, 1);
                self.catalog
                    .next_concepts(topic, &known)
                    .into_iter()
                    .map(|c| format!("{} ({})", c.name, topic))
                    .collect::<Vec<_>>()
            })
            .collect();

        let difficulty = learner.preferences.difficulty;
        let prompt = prompts::personalized_lesson(&prompts::LessonBrief {
            interests,
            profile,
            difficulty,
            granularity: &learner.preferences.granularity,
            recommendation: &recommendation,
            decision: &decision,
            approach: &approach,
            related: &related,
            ready: &ready,
        });

        let context = PromptContext::interests(interests).with_difficulty(difficulty);
        let reply = self.try_generate_response(&prompt, user_id, &context).await?;

        match parse_json::<Lesson>(&reply).filter(Lesson::is_usable) {
            Some(lesson) => Ok(lesson),
            None => {
                warn!("Failed to parse AI lesson response for user {}", user_id);
                debug!("Raw response: {}", reply);
                Ok(Lesson {
                    topic: interests.first().cloned(),
                    concept: Some("Learning".to_string()),
                    reasoning: Some("Fallback due to parsing error".to_string()),
                    ..Lesson::info(LESSON_TROUBLE, difficulty)
                })
            }
        }
    }
}

/// Interest analysis built from the raw text alone.
pub fn fallback_interest_analysis(raw_input: &str) -> InterestAnalysis {
    use types::{
        InterestCategory, InterestSummary, LearningProportions, LearningSchedule, StudyPlan,
    };

    let interests: Vec<String> = raw_input
        .split(|c| matches!(c, ',' | ';' | '.' | '\n' | '\r'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_FALLBACK_INTERESTS)
        .map(str::to_string)
        .collect();
    let primary = interests
        .first()
        .cloned()
        .unwrap_or_else(|| "General Learning".to_string());
    let secondary: Vec<String> = interests.iter().skip(1).cloned().collect();

    InterestAnalysis {
        analysis: InterestSummary {
            overall_tone: "neutral".to_string(),
            confidence_level: 50.0,
            learning_style: "exploratory".to_string(),
            learning_proportions: LearningProportions {
                primary_focus: primary.clone(),
                secondary_areas: secondary,
                learning_ratio: "Equal focus on all areas".to_string(),
            },
        },
        categories: interests
            .iter()
            .enumerate()
            .map(|(i, interest)| InterestCategory {
                name: interest.clone(),
                topics: vec![interest.clone()],
                difficulty: 50.0,
                confidence: 50.0,
                priority: if i == 0 { "primary" } else { "secondary" }.to_string(),
                proportion: (100.0 - 20.0 * i as f64).max(20.0),
                frequency: if i == 0 { "daily" } else { "weekly" }.to_string(),
                reasoning: "Fallback analysis - AI parsing failed".to_string(),
            })
            .collect(),
        recommendations: StudyPlan {
            starting_point: primary,
            learning_path: "Begin with basics".to_string(),
            focus_areas: interests.iter().take(3).cloned().collect(),
            learning_schedule: LearningSchedule {
                primary_focus: "Focus daily on main interest".to_string(),
                secondary_areas: "Include weekly variety".to_string(),
                balance: "Balanced learning approach".to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::llm::testing::ScriptedBackend;
    use crate::llm::Role;

    fn tutor(backend: ScriptedBackend) -> (Tutor, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let memory = Arc::new(ConversationMemory::new(20, 10));
        (Tutor::new(backend.clone(), memory, &test_config()), backend)
    }

    fn learner(interests: &[&str]) -> Learner {
        let mut profile = KnowledgeProfile::default();
        profile.insert("Python", "Functions", 1, 0.7, None);
        Learner {
            interests: interests.iter().map(|s| s.to_string()).collect(),
            knowledge_profile: profile,
            ..Learner::default()
        }
    }

    #[tokio::test]
    async fn test_generate_response_records_memory() {
        let (tutor, backend) = tutor(ScriptedBackend::new([
            "<think>keep it short</think>Closures capture scope.",
        ]));

        let reply = tutor
            .generate_response("What is a closure?", "5", &PromptContext::topic("JavaScript", 50))
            .await;
        assert_eq!(reply, "Closures capture scope.");
        assert_eq!(tutor.memory().user_size("5"), 2);

        let sent = &backend.requests()[0];
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent.last().unwrap().content, "What is a closure?");
    }

    #[tokio::test]
    async fn test_connection_failure_is_not_remembered() {
        let (tutor, _) = tutor(ScriptedBackend::offline());

        let reply = tutor.generate_response("hi", "5", &PromptContext::default()).await;
        assert_eq!(reply, CONNECTION_TROUBLE);
        assert_eq!(tutor.memory().user_size("5"), 0);
        assert!(tutor
            .try_generate_response("hi", "5", &PromptContext::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_learning_content_parses_or_wraps_reply() {
        let (tutor, _) = tutor(ScriptedBackend::new([
            "```json\n{\"content\": \"A tuple is immutable.\", \"type\": \"tip\"}\n```",
            "Tuples are immutable sequences.",
        ]));

        let lesson = tutor.generate_learning_content("1", "Python", "Tuples", 40).await.unwrap();
        assert_eq!(lesson.kind, "tip");

        let lesson = tutor.generate_learning_content("1", "Python", "Tuples", 40).await.unwrap();
        assert_eq!(lesson.kind, "info");
        assert_eq!(lesson.content, "Tuples are immutable sequences.");
        assert_eq!(lesson.difficulty, Some(40.0));
    }

    #[tokio::test]
    async fn test_response_analysis_fallback() {
        let (tutor, _) = tutor(ScriptedBackend::new(["Great answer, really!"]));
        let analysis = tutor
            .analyze_user_response("it loops", "Python", "Loops", None)
            .await
            .unwrap();
        assert_eq!(analysis, ResponseAnalysis::default());
        assert_eq!(tutor.memory().user_size(SYSTEM_SESSION), 2);
    }

    #[tokio::test]
    async fn test_escalation_fallback_shape() {
        // organize, recommend, then the escalation itself
        let (tutor, _) = tutor(ScriptedBackend::new(["", "", "Try generics with trait bounds."]));
        let lesson = tutor
            .generate_escalated_content("3", &KnowledgeProfile::default(), "Rust", "Traits", 90)
            .await
            .unwrap();

        assert_eq!(lesson.difficulty, Some(100.0));
        assert_eq!(lesson.concept.as_deref(), Some("Advanced Traits"));
        assert_eq!(lesson.content, "Try generics with trait bounds.");
        assert_eq!(
            lesson.reasoning.as_deref(),
            Some("Escalated content for advanced learners")
        );
    }

    #[tokio::test]
    async fn test_escalation_propagates_transport_error() {
        let (tutor, _) = tutor(ScriptedBackend::offline());
        assert!(tutor
            .generate_escalated_content("3", &KnowledgeProfile::default(), "Rust", "Traits", 50)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_recommendations_array_or_empty() {
        let (tutor, _) = tutor(ScriptedBackend::new([
            r#"[{"topic": "Python", "concept": "Decorators", "difficulty": 3, "reason": "next step"}]"#,
            "no idea",
        ]));
        let profile = KnowledgeProfile::default();
        let interests = vec!["Python".to_string()];

        let recs = tutor.generate_recommendations("1", &interests, &profile).await.unwrap();
        assert_eq!(recs[0].concept, "Decorators");
        let recs = tutor.generate_recommendations("1", &interests, &profile).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_personalized_lesson_requires_interests() {
        let (tutor, backend) = tutor(ScriptedBackend::offline());
        let err = tutor
            .generate_personalized_lesson("1", &Learner::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no learning interests"));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_personalized_lesson_uses_plan() {
        let quiz = r#"{"content": "Which keyword defines a function?", "type": "quiz",
            "topic": "JavaScript", "concept": "Functions", "difficulty": 50,
            "options": ["def", "function", "fn", "func"], "correctAnswer": 1,
            "correctAnswerText": "function"}"#;
        let (tutor, backend) = tutor(ScriptedBackend::new([
            r#"{"categories": [{"name": "Code", "topics": []}]}"#,
            r#"{"recommendedTopic": "JavaScript", "recommendedConcept": "Functions"}"#,
            r#"{"shouldLearn": true, "reasoning": "known in Python"}"#,
            quiz,
        ]));

        let lesson = tutor
            .generate_personalized_lesson("9", &learner(&["JavaScript"]))
            .await
            .unwrap();
        assert_eq!(lesson.options.len(), 4);
        assert_eq!(lesson.correct_answer_text.as_deref(), Some("function"));

        let requests = backend.requests();
        let prompt = &requests[3].last().unwrap().content;
        assert!(prompt.contains("You know Functions in Python"));
        assert!(prompt.contains("Variables (JavaScript)"));
        assert_eq!(tutor.memory().user_size("9"), 2);
    }

    #[tokio::test]
    async fn test_personalized_lesson_fallback() {
        let (tutor, _) = tutor(ScriptedBackend::new(["", "", "", "{\"type\": \"quiz\"}"]));
        let lesson = tutor
            .generate_personalized_lesson("9", &learner(&["Cooking", "Chess"]))
            .await
            .unwrap();
        assert_eq!(lesson.content, LESSON_TROUBLE);
        assert_eq!(lesson.topic.as_deref(), Some("Cooking"));
        assert_eq!(lesson.concept.as_deref(), Some("Learning"));
        assert_eq!(lesson.difficulty, Some(50.0));
    }

    #[tokio::test]
    async fn test_interest_analysis_fallback_split() {
        let (tutor, _) = tutor(ScriptedBackend::new(["I can't do JSON today"]));
        let analysis = tutor
            .analyze_interests(
                "Rust; cooking, chess.\nhistory, jazz, poetry",
                &serde_json::json!({}),
            )
            .await
            .unwrap();

        assert_eq!(analysis.categories.len(), 5);
        assert_eq!(analysis.categories[0].priority, "primary");
        assert_eq!(analysis.categories[0].frequency, "daily");
        assert_eq!(analysis.categories[4].proportion, 20.0);
        assert_eq!(analysis.categories[2].proportion, 60.0);
        assert_eq!(analysis.analysis.learning_proportions.primary_focus, "Rust");
        assert_eq!(analysis.recommendations.focus_areas.len(), 3);
    }
}
