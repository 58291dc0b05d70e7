//! Concept catalog: which concepts exist per topic and how they depend on each other.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default = "default_granularity")]
    pub granularity: String,
}

fn default_difficulty() -> u8 {
    1
}

fn default_granularity() -> String {
    "high".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConcepts {
    pub name: String,
    #[serde(default)]
    pub concepts: Vec<ConceptDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptCatalog {
    #[serde(default)]
    pub topics: Vec<TopicConcepts>,
}

impl ConceptCatalog {
    pub fn topics(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn concepts_for(&self, topic: &str) -> &[ConceptDef] {
        self.topics
            .iter()
            .find(|t| t.name == topic)
            .map(|t| t.concepts.as_slice())
            .unwrap_or(&[])
    }

    pub fn by_max_difficulty(&self, topic: &str, max_difficulty: u8) -> Vec<&ConceptDef> {
        self.concepts_for(topic)
            .iter()
            .filter(|c| c.difficulty <= max_difficulty)
            .collect()
    }

    pub fn unknown(&self, topic: &str, known: &[String]) -> Vec<&ConceptDef> {
        self.concepts_for(topic)
            .iter()
            .filter(|c| !known.contains(&c.name))
            .collect()
    }

    pub fn prerequisites(&self, topic: &str, concept: &str) -> &[String] {
        self.concepts_for(topic)
            .iter()
            .find(|c| c.name == concept)
            .map(|c| c.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_ready(&self, topic: &str, concept: &str, known: &[String]) -> bool {
        self.prerequisites(topic, concept)
            .iter()
            .all(|p| known.contains(p))
    }

    /// Concepts whose prerequisites are all known and which are not known yet.
    pub fn next_concepts(&self, topic: &str, known: &[String]) -> Vec<&ConceptDef> {
        self.concepts_for(topic)
            .iter()
            .filter(|c| !known.contains(&c.name) && self.is_ready(topic, &c.name, known))
            .collect()
    }
}

type ConceptRow = (&'static str, &'static str, u8, &'static [&'static str]);

fn topic(name: &str, granularity: &str, rows: &[ConceptRow]) -> TopicConcepts {
    TopicConcepts {
        name: name.to_string(),
        concepts: rows
            .iter()
            .map(|(concept, description, difficulty, prereqs)| ConceptDef {
                name: concept.to_string(),
                description: description.to_string(),
                difficulty: *difficulty,
                prerequisites: prereqs.iter().map(|p| p.to_string()).collect(),
                granularity: granularity.to_string(),
            })
            .collect(),
    }
}

static JAVASCRIPT: &[ConceptRow] = &[
    ("Variables", "Understanding variable declaration and assignment", 1, &[]),
    ("Functions", "Creating and calling functions", 2, &["Variables"]),
    ("Loops", "for loops, while loops, and iteration", 2, &["Variables"]),
    ("Arrays", "Working with arrays and array methods", 2, &["Variables"]),
    ("Objects", "Creating and manipulating objects", 3, &["Variables", "Functions"]),
    ("Async/Await", "Asynchronous programming with async/await", 4, &["Functions", "Objects"]),
    ("Closures", "Understanding closure scope and behavior", 4, &["Functions", "Objects"]),
];

static PYTHON: &[ConceptRow] = &[
    ("Variables", "Variable assignment and data types", 1, &[]),
    ("Functions", "Defining and calling functions", 2, &["Variables"]),
    ("Lists", "Working with Python lists", 2, &["Variables"]),
    ("Dictionaries", "Key-value pairs and dictionary operations", 3, &["Variables", "Functions"]),
    ("List Comprehensions", "Efficient list creation and manipulation", 3, &["Lists", "Functions"]),
    ("Generators", "Creating and using generators", 4, &["Functions", "List Comprehensions"]),
];

static COOKING: &[ConceptRow] = &[
    ("Knife Skills", "Basic knife techniques and safety", 1, &[]),
    ("Heat Control", "Understanding different heat levels and cooking methods", 2, &[]),
    ("Seasoning", "Salt, pepper, and basic seasoning techniques", 1, &[]),
    ("Sauce Making", "Creating basic sauces and gravies", 3, &["Heat Control", "Seasoning"]),
    (
        "Baking Techniques",
        "Understanding baking science and techniques",
        4,
        &["Heat Control", "Seasoning"],
    ),
];

static HISTORY: &[ConceptRow] = &[
    ("Ancient Civilizations", "Early human civilizations and their contributions", 1, &[]),
    ("World Wars", "Major events and impacts of World Wars I and II", 2, &[]),
    ("Renaissance", "Cultural and intellectual rebirth in Europe", 3, &["Ancient Civilizations"]),
    (
        "Industrial Revolution",
        "Technological and social changes in the 18th-19th centuries",
        3,
        &["Renaissance"],
    ),
];

static PHILOSOPHY: &[ConceptRow] = &[
    ("Ethics", "Moral philosophy and ethical theories", 2, &[]),
    ("Logic", "Logical reasoning and argumentation", 3, &[]),
    ("Metaphysics", "Nature of reality and existence", 4, &["Logic"]),
    ("Epistemology", "Theory of knowledge and how we know things", 4, &["Logic", "Metaphysics"]),
];

pub fn builtin() -> ConceptCatalog {
    ConceptCatalog {
        topics: vec![
            topic("JavaScript", "high", JAVASCRIPT),
            topic("Python", "high", PYTHON),
            topic("Cooking", "flexible", COOKING),
            topic("History", "flexible", HISTORY),
            topic("Philosophy", "flexible", PHILOSOPHY),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_concepts_respects_prerequisites() {
        let catalog = builtin();
        let known = vec!["Variables".to_string()];
        let next: Vec<&str> = catalog
            .next_concepts("JavaScript", &known)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(next, vec!["Functions", "Loops", "Arrays"]);

        assert!(!catalog.is_ready("JavaScript", "Objects", &known));
        assert!(catalog.is_ready("Cooking", "Knife Skills", &[]));
    }

    #[test]
    fn test_catalog_queries() {
        let catalog = builtin();
        assert_eq!(catalog.topics().len(), 5);
        assert!(catalog.concepts_for("Astronomy").is_empty());
        assert_eq!(catalog.by_max_difficulty("Philosophy", 3).len(), 2);
        assert_eq!(catalog.unknown("History", &["World Wars".to_string()]).len(), 3);
        assert_eq!(catalog.prerequisites("Python", "Generators").len(), 2);
    }

    #[test]
    fn test_catalog_from_toml() {
        let raw = r#"
            [[topics]]
            name = "Rust"

            [[topics.concepts]]
            name = "Ownership"
            description = "Moves and borrows"

            [[topics.concepts]]
            name = "Lifetimes"
            difficulty = 3
            prerequisites = ["Ownership"]
        "#;
        let catalog: ConceptCatalog = toml::from_str(raw).unwrap();
        let concepts = catalog.concepts_for("Rust");
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].difficulty, 1);
        assert_eq!(concepts[0].granularity, "high");
        assert_eq!(concepts[1].prerequisites, vec!["Ownership".to_string()]);
    }
}
