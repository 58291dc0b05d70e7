//! Static topic hierarchy: category -> topic -> concept -> level -> sub-skills.

use serde::Serialize;

use super::difficulty::LevelBand;
use super::profile::{KnowledgeProfile, LEARNING};

pub struct ConceptLevels {
    pub concept: &'static str,
    pub basic: &'static [&'static str],
    pub intermediate: &'static [&'static str],
    pub advanced: &'static [&'static str],
}

impl ConceptLevels {
    pub fn skills(&self, band: LevelBand) -> &'static [&'static str] {
        match band {
            LevelBand::Basic => self.basic,
            LevelBand::Intermediate => self.intermediate,
            LevelBand::Advanced => self.advanced,
        }
    }
}

pub struct TopicNode {
    pub category: &'static str,
    pub topic: &'static str,
    pub concepts: &'static [ConceptLevels],
}

pub static HIERARCHY: &[TopicNode] = &[
    TopicNode {
        category: "Code",
        topic: "JavaScript",
        concepts: &[
            ConceptLevels {
                concept: "Variables",
                basic: &["let", "var", "const declarations"],
                intermediate: &["hoisting", "temporal dead zone", "scope"],
                advanced: &["closure", "prototype chain", "memory management"],
            },
            ConceptLevels {
                concept: "Functions",
                basic: &["function declarations", "parameters", "return"],
                intermediate: &["arrow functions", "callbacks", "scope"],
                advanced: &["closures", "currying", "functional programming"],
            },
            ConceptLevels {
                concept: "Loops",
                basic: &["for loops", "while loops", "basic iteration"],
                intermediate: &["for...of", "for...in", "array methods"],
                advanced: &["iterators", "generators", "async iteration"],
            },
        ],
    },
    TopicNode {
        category: "Code",
        topic: "Python",
        concepts: &[
            ConceptLevels {
                concept: "Variables",
                basic: &["assignment", "data types", "naming"],
                intermediate: &["scope", "global", "nonlocal"],
                advanced: &["memory management", "garbage collection"],
            },
            ConceptLevels {
                concept: "Functions",
                basic: &["def", "parameters", "return"],
                intermediate: &["lambda", "decorators", "scope"],
                advanced: &["closures", "generators", "metaclasses"],
            },
            ConceptLevels {
                concept: "Loops",
                basic: &["for loops", "while loops", "range()"],
                intermediate: &["list comprehensions", "enumerate", "zip"],
                advanced: &["generators", "itertools", "async iteration"],
            },
        ],
    },
    TopicNode {
        category: "Cooking",
        topic: "Cooking",
        concepts: &[
            ConceptLevels {
                concept: "Knife Skills",
                basic: &["grip", "basic cuts", "safety"],
                intermediate: &["julienne", "brunoise", "chiffonade"],
                advanced: &["butchering", "specialty cuts", "knife maintenance"],
            },
            ConceptLevels {
                concept: "Heat Control",
                basic: &["temperature levels", "pan selection", "timing"],
                intermediate: &["searing", "braising", "roasting"],
                advanced: &["sous vide", "molecular gastronomy", "precision cooking"],
            },
        ],
    },
];

const GENERAL_CONTENT: &str = "General learning content";

pub struct TopicPath {
    pub category: &'static str,
    pub topic: &'static str,
    pub levels: &'static ConceptLevels,
}

pub fn topic_path(topic: &str, concept: &str) -> Option<TopicPath> {
    HIERARCHY
        .iter()
        .filter(|node| node.topic == topic)
        .find_map(|node| {
            node.concepts
                .iter()
                .find(|c| c.concept == concept)
                .map(|levels| TopicPath {
                    category: node.category,
                    topic: node.topic,
                    levels,
                })
        })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRecommendation {
    pub topic: String,
    pub concept: String,
    pub difficulty_level: LevelBand,
    pub content: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedConcept {
    pub topic: String,
    pub concept: String,
    pub reason: String,
}

/// Pick the sub-skills to teach for `concept` from the learner's current proficiency.
pub fn recommend(
    profile: &KnowledgeProfile,
    topic: &str,
    concept: &str,
) -> HierarchyRecommendation {
    let band = LevelBand::from_proficiency(profile.proficiency(topic, concept));
    let content = match topic_path(topic, concept) {
        Some(path) => path.levels.skills(band).iter().map(|s| s.to_string()).collect(),
        None => vec![GENERAL_CONTENT.to_string()],
    };

    HierarchyRecommendation {
        topic: topic.to_string(),
        concept: concept.to_string(),
        difficulty_level: band,
        content,
        reasoning: reasoning_for(topic, concept, band),
    }
}

fn reasoning_for(topic: &str, concept: &str, band: LevelBand) -> String {
    match band {
        LevelBand::Basic => format!(
            "Starting with basics since you're new to {} in {}",
            concept, topic
        ),
        LevelBand::Intermediate => format!(
            "Building on your existing knowledge of {} in {}",
            concept, topic
        ),
        LevelBand::Advanced => format!(
            "Advanced content since you've mastered the basics of {} in {}",
            concept, topic
        ),
    }
}

/// Sibling concepts of `concept` within the same topic.
pub fn related_concepts(topic: &str, concept: &str) -> Vec<RelatedConcept> {
    let Some(node) = HIERARCHY.iter().find(|n| n.topic == topic) else {
        return Vec::new();
    };
    if !node.concepts.iter().any(|c| c.concept == concept) {
        return Vec::new();
    }

    node.concepts
        .iter()
        .filter(|c| c.concept != concept)
        .map(|c| RelatedConcept {
            topic: topic.to_string(),
            concept: c.concept.to_string(),
            reason: format!("Related to {} in {}", concept, topic),
        })
        .collect()
}

/// Suggestions branching out from every concept the learner already knows.
pub fn next_learning_path(profile: &KnowledgeProfile) -> Vec<RelatedConcept> {
    let mut out: Vec<RelatedConcept> = Vec::new();
    for (topic, concept, knowledge) in profile.iter() {
        if knowledge.proficiency < LEARNING {
            continue;
        }
        for related in related_concepts(topic, concept) {
            let already_known = profile.proficiency(&related.topic, &related.concept) >= LEARNING;
            let duplicate = out
                .iter()
                .any(|r| r.topic == related.topic && r.concept == related.concept);
            if !already_known && !duplicate {
                out.push(related);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_uses_proficiency_band() {
        let mut profile = KnowledgeProfile::default();
        let rec = recommend(&profile, "JavaScript", "Variables");
        assert_eq!(rec.difficulty_level, LevelBand::Basic);
        assert!(rec.content.contains(&"const declarations".to_string()));
        assert!(rec.reasoning.starts_with("Starting with basics"));

        profile.insert("JavaScript", "Variables", 2, 0.9, None);
        let rec = recommend(&profile, "JavaScript", "Variables");
        assert_eq!(rec.difficulty_level, LevelBand::Advanced);
        assert!(rec.content.contains(&"prototype chain".to_string()));
    }

    #[test]
    fn test_unknown_path_falls_back() {
        let rec = recommend(&KnowledgeProfile::default(), "Astronomy", "Orbits");
        assert_eq!(rec.content, vec![GENERAL_CONTENT.to_string()]);
        assert!(topic_path("Astronomy", "Orbits").is_none());
        assert_eq!(topic_path("Cooking", "Heat Control").unwrap().category, "Cooking");
    }

    #[test]
    fn test_next_learning_path_skips_known() {
        let mut profile = KnowledgeProfile::default();
        profile.insert("Python", "Loops", 1, 0.8, None);
        profile.insert("Python", "Functions", 1, 0.8, None);

        let path = next_learning_path(&profile);
        let concepts: Vec<&str> = path.iter().map(|r| r.concept.as_str()).collect();
        assert_eq!(concepts, vec!["Variables"]);
    }
}
