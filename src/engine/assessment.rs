//! Turning learner answers into knowledge-state updates.

use serde::{Deserialize, Serialize};

use super::profile::{ConceptKnowledge, LEARNING, MASTERED};

const CORRECTNESS_THRESHOLD: f64 = 0.3;

const BASIC_PATTERNS: &[&str] = &["basic", "simple", "easy", "just", "only"];
const ADVANCED_PATTERNS: &[&str] = &[
    "complex",
    "sophisticated",
    "intricate",
    "nuanced",
    "advanced",
];

fn technical_terms(topic: &str) -> &'static [&'static str] {
    match topic {
        "JavaScript" => &[
            "closure",
            "prototype",
            "async",
            "await",
            "promise",
            "callback",
            "hoisting",
        ],
        "Cooking" => &["sous vide", "brunoise", "julienne", "mirepoix", "roux", "emulsification"],
        "History" => &[
            "chronology",
            "historiography",
            "primary source",
            "secondary source",
            "bias",
        ],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub is_correct: bool,
    pub confidence: f64,
    pub difficulty_level: ResponseLevel,
    pub suggestions: Vec<String>,
}

/// Keyword heuristic for free-text answers.
pub fn analyze_text_input(user_input: &str, expected_answer: &str, topic: &str) -> TextAnalysis {
    let input = user_input.to_lowercase();
    let input_words: Vec<&str> = input.split_whitespace().collect();
    let expected = expected_answer.to_lowercase();
    let expected_words: Vec<&str> = expected.split_whitespace().collect();

    let contains_pattern =
        |pattern: &str| input_words.iter().any(|word| word.contains(pattern));

    let has_advanced_terms = technical_terms(topic).iter().any(|term| {
        if term.contains(' ') {
            input.contains(*term)
        } else {
            contains_pattern(*term)
        }
    });
    let has_basic_language = BASIC_PATTERNS.iter().any(|p| contains_pattern(*p));
    let has_advanced_language = ADVANCED_PATTERNS.iter().any(|p| contains_pattern(*p));

    let (difficulty_level, confidence) = if has_advanced_terms || has_advanced_language {
        (ResponseLevel::Advanced, 0.8)
    } else if has_basic_language {
        (ResponseLevel::Beginner, 0.6)
    } else {
        (ResponseLevel::Intermediate, 0.7)
    };

    let is_correct = if expected_words.is_empty() {
        false
    } else {
        let matched = expected_words
            .iter()
            .filter(|&&word| input_words.iter().any(|input_word| input_word.contains(word)))
            .count();
        matched as f64 / expected_words.len() as f64 > CORRECTNESS_THRESHOLD
    };

    TextAnalysis {
        is_correct,
        confidence,
        difficulty_level,
        suggestions: Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizVerdict {
    pub is_correct: bool,
    pub feedback: String,
    pub correct_answer: String,
}

pub fn validate_quiz(user_answer: i64, correct_index: i64, correct_text: &str) -> QuizVerdict {
    let is_correct = user_answer == correct_index;
    let feedback = if is_correct {
        format!("Correct! {}", correct_text)
    } else {
        format!("Not quite. The correct answer is: {}", correct_text)
    };
    QuizVerdict {
        is_correct,
        feedback,
        correct_answer: correct_text.to_string(),
    }
}

/// Knowledge-state change produced by one interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub proficiency: i64,
    pub confidence: f64,
    /// Positive outcomes never lower an existing entry.
    pub monotonic: bool,
}

impl Outcome {
    pub fn quiz(correct: bool) -> Self {
        if correct {
            Self {
                proficiency: LEARNING,
                confidence: 0.8,
                monotonic: true,
            }
        } else {
            Self {
                proficiency: 0,
                confidence: 0.2,
                monotonic: false,
            }
        }
    }

    pub fn text(analysis: &TextAnalysis) -> Self {
        Self {
            proficiency: if analysis.is_correct { LEARNING } else { 0 },
            confidence: analysis.confidence,
            monotonic: analysis.is_correct,
        }
    }

    pub fn mastered() -> Self {
        Self {
            proficiency: MASTERED,
            confidence: 0.9,
            monotonic: true,
        }
    }

    /// Values to store given the current entry, if any.
    pub fn apply(&self, existing: Option<&ConceptKnowledge>) -> (i64, f64) {
        let confidence = self.confidence.clamp(0.0, 1.0);
        match existing {
            Some(current) if self.monotonic => (
                self.proficiency.max(current.proficiency),
                confidence.max(current.confidence),
            ),
            _ => (self.proficiency, confidence),
        }
    }
}

/// Hand-written follow-ups used when the model cannot produce an escalation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticEscalation {
    pub content: &'static str,
    pub difficulty: u8,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<&'static str>,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<u8>,
}

fn no_options(options: &&[&str]) -> bool {
    options.is_empty()
}

pub fn static_escalation(topic: &str, concept: &str) -> Option<StaticEscalation> {
    let entry = match (topic, concept) {
        ("JavaScript", "Variables") => StaticEscalation {
            content: "Explain the difference between temporal dead zone and hoisting in JavaScript variable declarations.",
            difficulty: 3,
            kind: "text_input",
            expected_answer: Some("temporal dead zone hoisting let const var"),
            options: &[],
            correct_answer: None,
        },
        ("JavaScript", "Functions") => StaticEscalation {
            content: "What is the difference between function declarations and function expressions in terms of hoisting behavior?",
            difficulty: 3,
            kind: "quiz",
            expected_answer: None,
            options: &[
                "No difference",
                "Function declarations are hoisted, expressions are not",
                "Function expressions are hoisted, declarations are not",
            ],
            correct_answer: Some(1),
        },
        ("Cooking", "Knife Skills") => StaticEscalation {
            content: "Explain the proper technique for chiffonade and why it's different from julienne cuts.",
            difficulty: 3,
            kind: "text_input",
            expected_answer: Some("chiffonade julienne technique difference"),
            options: &[],
            correct_answer: None,
        },
        ("Cooking", "Heat Control") => StaticEscalation {
            content: "What is the Maillard reaction and how does it differ from caramelization?",
            difficulty: 4,
            kind: "quiz",
            expected_answer: None,
            options: &[
                "Same thing",
                "Maillard involves proteins, caramelization is just sugars",
                "Caramelization is faster",
            ],
            correct_answer: Some(1),
        },
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advanced_terms_raise_level() {
        let a = analyze_text_input(
            "A closure captures variables from the enclosing scope",
            "closure captures scope",
            "JavaScript",
        );
        assert_eq!(a.difficulty_level, ResponseLevel::Advanced);
        assert_eq!(a.confidence, 0.8);
        assert!(a.is_correct);
    }

    #[test]
    fn test_multi_word_terms_and_basic_language() {
        let a = analyze_text_input("cook it sous vide at low temp", "water bath", "Cooking");
        assert_eq!(a.difficulty_level, ResponseLevel::Advanced);
        assert!(!a.is_correct);

        let b = analyze_text_input("it is just a simple cut", "chiffonade ribbons", "Cooking");
        assert_eq!(b.difficulty_level, ResponseLevel::Beginner);
        assert_eq!(b.confidence, 0.6);

        let c = analyze_text_input("the treaty ended it", "treaty of versailles", "History");
        assert_eq!(c.difficulty_level, ResponseLevel::Intermediate);
        // 1 of 3 expected words matched -> 0.33 > 0.3
        assert!(c.is_correct);
    }

    #[test]
    fn test_empty_expected_answer_is_never_correct() {
        assert!(!analyze_text_input("anything", "   ", "History").is_correct);
    }

    #[test]
    fn test_quiz_validation_feedback() {
        let ok = validate_quiz(1, 1, "<p>");
        assert!(ok.is_correct);
        assert_eq!(ok.feedback, "Correct! <p>");

        let wrong = validate_quiz(0, 1, "<p>");
        assert!(!wrong.is_correct);
        assert_eq!(wrong.feedback, "Not quite. The correct answer is: <p>");
    }

    #[test]
    fn test_correct_outcome_never_lowers_state() {
        let existing = ConceptKnowledge {
            proficiency: 2,
            confidence: 0.9,
            last_practiced: None,
        };
        assert_eq!(Outcome::quiz(true).apply(Some(&existing)), (2, 0.9));
        assert_eq!(Outcome::quiz(true).apply(None), (1, 0.8));
        // Incorrect answers replace the entry outright
        assert_eq!(Outcome::quiz(false).apply(Some(&existing)), (0, 0.2));
        assert_eq!(Outcome::mastered().apply(None), (2, 0.9));
    }

    #[test]
    fn test_static_escalation_lookup() {
        let e = static_escalation("Cooking", "Heat Control").unwrap();
        assert_eq!(e.kind, "quiz");
        assert_eq!(e.correct_answer, Some(1));
        assert!(static_escalation("History", "Renaissance").is_none());
    }
}
