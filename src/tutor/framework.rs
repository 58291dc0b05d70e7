//! Model-driven organisation of a learner's interests.
//!
//! Nothing here is hard-coded per subject: the model proposes a structure,
//! picks the next concept and judges whether a concept is worth revisiting in
//! a new setting. Every call has a fixed fallback so lesson planning never
//! stalls on a bad reply.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::prompts;
use super::types::{
    ContextDecision, FrameworkTopic, Learner, LearningPathPlan, Recommendation, TopicCategory,
    TopicStructure,
};
use super::{Conversation, SYSTEM_SESSION};
use crate::llm::response::parse_json;
use crate::system_prompt::PromptContext;

const DEFAULT_CACHE_SIZE: usize = 64;

pub struct TopicFramework {
    conversation: Conversation,
    cache: Mutex<LruCache<String, TopicStructure>>,
}

impl TopicFramework {
    pub fn new(conversation: Conversation, cache_size: usize) -> Self {
        let cap = NonZeroUsize::new(cache_size)
            .or_else(|| NonZeroUsize::new(DEFAULT_CACHE_SIZE))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            conversation,
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<String, TopicStructure>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cache_key(interests: &[String]) -> String {
        serde_json::to_string(interests).unwrap_or_default()
    }

    /// Reply text, or `None` when the model could not be reached.
    async fn ask(&self, prompt: &str) -> Option<String> {
        match self
            .conversation
            .try_respond(prompt, SYSTEM_SESSION, &PromptContext::default())
            .await
        {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!("Topic framework request failed: {}", e);
                None
            }
        }
    }

    pub async fn organize_topics(&self, interests: &[String], learner: &Learner) -> TopicStructure {
        let profile = serde_json::to_value(learner).unwrap_or_default();
        let prompt = prompts::organize_topics(interests, &profile);

        let parsed = self
            .ask(&prompt)
            .await
            .and_then(|reply| parse_json::<TopicStructure>(&reply))
            .filter(|s| !s.categories.is_empty());

        match parsed {
            Some(structure) => {
                self.cache().put(Self::cache_key(interests), structure.clone());
                structure
            }
            None => {
                warn!("Failed to organize topics with AI, using fallback structure");
                fallback_structure(interests)
            }
        }
    }

    pub async fn recommended_content(
        &self,
        learner: &Learner,
        interests: &[String],
        current_topic: Option<&str>,
    ) -> Recommendation {
        let cached = self.cache().get(&Self::cache_key(interests)).cloned();
        let structure = match cached {
            Some(structure) => {
                debug!("Topic structure cache hit for {:?}", interests);
                structure
            }
            None => self.organize_topics(interests, learner).await,
        };

        let prompt = prompts::recommend_next(
            &learner.knowledge_profile,
            interests,
            current_topic,
            &structure,
        );

        self.ask(&prompt)
            .await
            .and_then(|reply| parse_json::<Recommendation>(&reply))
            .filter(|r| !r.recommended_topic.trim().is_empty())
            .unwrap_or_else(|| {
                warn!("Failed to get AI recommendation, starting with basics");
                fallback_recommendation(interests)
            })
    }

    pub async fn should_learn_in_new_context(
        &self,
        learner: &Learner,
        concept: &str,
        new_context: &str,
    ) -> ContextDecision {
        let profile = serde_json::to_value(learner).unwrap_or_default();
        let prompt = prompts::context_decision(&profile, concept, new_context);

        self.ask(&prompt)
            .await
            .and_then(|reply| parse_json::<ContextDecision>(&reply))
            .unwrap_or_default()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_structures(&self) -> usize {
        self.cache().len()
    }
}

pub fn fallback_structure(interests: &[String]) -> TopicStructure {
    TopicStructure {
        categories: vec![TopicCategory {
            name: "General Learning".to_string(),
            description: "User's learning interests".to_string(),
            topics: interests
                .iter()
                .map(|interest| FrameworkTopic {
                    name: interest.clone(),
                    description: format!("Learning about {}", interest),
                    concepts: vec!["basics".into(), "intermediate".into(), "advanced".into()],
                    difficulty: "Basic".to_string(),
                    prerequisites: Vec::new(),
                    learning_path: "Start with basics and progress".to_string(),
                })
                .collect(),
        }],
        learning_paths: vec![LearningPathPlan {
            name: "General Path".to_string(),
            description: "Basic learning progression".to_string(),
            steps: vec![
                "Learn fundamentals".into(),
                "Practice".into(),
                "Apply knowledge".into(),
            ],
        }],
    }
}

pub fn fallback_recommendation(interests: &[String]) -> Recommendation {
    Recommendation {
        recommended_topic: interests
            .first()
            .cloned()
            .unwrap_or_else(|| "General Learning".to_string()),
        recommended_concept: "basics".to_string(),
        difficulty_level: "Basic".to_string(),
        reasoning: "Starting with basics".to_string(),
        learning_path: "Begin with fundamentals".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedBackend;
    use crate::memory::ConversationMemory;
    use std::sync::Arc;

    fn framework(backend: ScriptedBackend) -> (TopicFramework, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let conversation =
            Conversation::new(backend.clone(), Arc::new(ConversationMemory::new(20, 10)));
        (TopicFramework::new(conversation, 4), backend)
    }

    const STRUCTURE: &str =
        r#"{"categories": [{"name": "Languages", "topics": [{"name": "Rust", "concepts": ["Ownership"]}]}]}"#;

    #[tokio::test]
    async fn test_structure_is_cached_per_interest_list() {
        let (fw, backend) = framework(ScriptedBackend::new([
            STRUCTURE,
            r#"{"recommendedTopic": "Rust", "recommendedConcept": "Ownership"}"#,
            r#"{"recommendedTopic": "Rust", "recommendedConcept": "Borrowing"}"#,
        ]));
        let interests = vec!["Rust".to_string()];
        let learner = Learner::default();

        let first = fw.recommended_content(&learner, &interests, None).await;
        assert_eq!(first.recommended_concept, "Ownership");
        assert_eq!(fw.cached_structures(), 1);

        let second = fw.recommended_content(&learner, &interests, Some("Rust")).await;
        assert_eq!(second.recommended_concept, "Borrowing");
        // organize + two recommendations, no second organize call
        assert_eq!(backend.requests().len(), 3);

        fw.clear_cache();
        assert_eq!(fw.cached_structures(), 0);
    }

    #[tokio::test]
    async fn test_fallbacks_when_model_unreachable() {
        let (fw, _) = framework(ScriptedBackend::offline());
        let interests = vec!["Baking".to_string(), "Chess".to_string()];
        let learner = Learner::default();

        let structure = fw.organize_topics(&interests, &learner).await;
        assert_eq!(structure.categories[0].name, "General Learning");
        assert_eq!(structure.categories[0].topics.len(), 2);
        assert_eq!(fw.cached_structures(), 0);

        let rec = fw.recommended_content(&learner, &interests, None).await;
        assert_eq!(rec.recommended_topic, "Baking");
        assert_eq!(rec.difficulty_level, "Basic");

        let decision = fw.should_learn_in_new_context(&learner, "basics", "new context").await;
        assert!(decision.should_learn);
        assert_eq!(decision.reasoning, "Fallback decision");
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_fallback() {
        let (fw, _) = framework(ScriptedBackend::new(["Sure, here are some ideas!"]));
        let rec = fw.recommended_content(&Learner::default(), &[], None).await;
        assert_eq!(rec.recommended_topic, "General Learning");
    }
}
