//! In-memory view of a learner's knowledge state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MASTERED: i64 = 2;
pub const LEARNING: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptKnowledge {
    pub proficiency: i64,
    pub confidence: f64,
    #[serde(default)]
    pub last_practiced: Option<String>,
}

/// topic -> concept -> knowledge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeProfile(BTreeMap<String, BTreeMap<String, ConceptKnowledge>>);

impl KnowledgeProfile {
    pub fn insert(
        &mut self,
        topic: &str,
        concept: &str,
        proficiency: i64,
        confidence: f64,
        last_practiced: Option<String>,
    ) {
        self.0.entry(topic.to_string()).or_default().insert(
            concept.to_string(),
            ConceptKnowledge {
                proficiency,
                confidence,
                last_practiced,
            },
        );
    }

    pub fn get(&self, topic: &str, concept: &str) -> Option<&ConceptKnowledge> {
        self.0.get(topic).and_then(|c| c.get(concept))
    }

    pub fn topic(&self, topic: &str) -> Option<&BTreeMap<String, ConceptKnowledge>> {
        self.0.get(topic)
    }

    pub fn proficiency(&self, topic: &str, concept: &str) -> i64 {
        self.get(topic, concept).map(|k| k.proficiency).unwrap_or(0)
    }

    /// Concepts under `topic` with at least `min` proficiency.
    pub fn known_concepts(&self, topic: &str, min: i64) -> Vec<String> {
        self.topic(topic)
            .map(|concepts| {
                concepts
                    .iter()
                    .filter(|(_, k)| k.proficiency >= min)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String, &ConceptKnowledge)> {
        self.0
            .iter()
            .flat_map(|(topic, concepts)| concepts.iter().map(move |(c, k)| (topic, c, k)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Approach {
    Syntactic,
    Conceptual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningApproach {
    pub approach: Approach,
    pub reasoning: String,
    pub focus: String,
}

/// Decide whether `concept` should be taught as new material or as a syntax
/// delta from another topic where the learner already knows it.
pub fn learning_approach(
    profile: &KnowledgeProfile,
    topic: &str,
    concept: &str,
) -> LearningApproach {
    let known_elsewhere = profile
        .iter()
        .find(|(t, c, k)| {
            t.as_str() != topic && c.as_str() == concept && k.proficiency >= LEARNING
        });

    match known_elsewhere {
        Some((known_topic, _, _)) => LearningApproach {
            approach: Approach::Syntactic,
            reasoning: format!(
                "You know {} in {}, so we'll focus on {} syntax differences",
                concept, known_topic, topic
            ),
            focus: "syntax differences, language-specific features".to_string(),
        },
        None => LearningApproach {
            approach: Approach::Conceptual,
            reasoning: format!("Learning {} for the first time", concept),
            focus: "understanding the concept, how it works, why it is useful".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntactic_when_known_in_other_topic() {
        let mut profile = KnowledgeProfile::default();
        profile.insert("JavaScript", "Loops", 1, 0.8, None);

        let approach = learning_approach(&profile, "Python", "Loops");
        assert_eq!(approach.approach, Approach::Syntactic);
        assert!(approach.reasoning.contains("in JavaScript"));
        assert!(approach.reasoning.contains("Python syntax"));
    }

    #[test]
    fn test_conceptual_when_unknown_or_same_topic() {
        let mut profile = KnowledgeProfile::default();
        profile.insert("Python", "Loops", 2, 0.9, None);
        profile.insert("JavaScript", "Closures", 0, 0.2, None);

        assert_eq!(
            learning_approach(&profile, "Python", "Loops").approach,
            Approach::Conceptual
        );
        assert_eq!(
            learning_approach(&profile, "Python", "Closures").approach,
            Approach::Conceptual
        );
    }

    #[test]
    fn test_profile_serializes_nested() {
        let mut profile = KnowledgeProfile::default();
        profile.insert("Cooking", "Knife Skills", 1, 0.7, Some("2026-01-01 10:00:00".into()));
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["Cooking"]["Knife Skills"]["proficiency"], 1);
        assert_eq!(json["Cooking"]["Knife Skills"]["lastPracticed"], "2026-01-01 10:00:00");
        assert_eq!(profile.known_concepts("Cooking", 1), vec!["Knife Skills".to_string()]);
    }
}
