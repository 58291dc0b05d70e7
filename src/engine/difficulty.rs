//! Difficulty scales used when choosing lesson content.
//!
//! Two scales coexist: the 0-100 percentage the model is asked to target, and
//! the coarse level band derived from a learner's per-concept proficiency.

use serde::{Deserialize, Serialize};

use super::profile::KnowledgeProfile;

/// Step applied when a learner reports a lesson as too easy.
pub const ESCALATION_STEP: u8 = 25;
pub const MAX_DIFFICULTY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLabel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyLabel {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            0..=25 => Self::Beginner,
            26..=50 => Self::Intermediate,
            51..=75 => Self::Advanced,
            _ => Self::Expert,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    /// Phrase embedded in prompts, e.g. "advanced level".
    pub fn description(&self) -> String {
        format!("{} level", self.as_str())
    }
}

pub fn describe(percentage: u8) -> String {
    DifficultyLabel::from_percentage(percentage).description()
}

pub fn escalate(percentage: u8) -> u8 {
    percentage.saturating_add(ESCALATION_STEP).min(MAX_DIFFICULTY)
}

/// Clamp a model-supplied difficulty into the 0-100 range.
pub fn clamp_percentage(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, MAX_DIFFICULTY as f64) as u8
}

/// Coarse band used by the static topic hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelBand {
    Basic,
    Intermediate,
    Advanced,
}

impl LevelBand {
    pub fn from_proficiency(proficiency: i64) -> Self {
        if proficiency >= 2 {
            Self::Advanced
        } else if proficiency >= 1 {
            Self::Intermediate
        } else {
            Self::Basic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

/// Target percentage for a learner's next lesson.
///
/// With no knowledge entries under any of the learner's interests the
/// configured default is used; otherwise mean proficiency moves the target
/// in quarter steps (0 -> 25, 1 -> 50, 2 -> 75, ...).
pub fn preferred_difficulty(profile: &KnowledgeProfile, interests: &[String], default: u8) -> u8 {
    let levels: Vec<i64> = interests
        .iter()
        .filter_map(|topic| profile.topic(topic))
        .flat_map(|concepts| concepts.values().map(|k| k.proficiency))
        .collect();

    if levels.is_empty() {
        return default.min(MAX_DIFFICULTY);
    }

    let mean = levels.iter().sum::<i64>() as f64 / levels.len() as f64;
    clamp_percentage(25.0 + 25.0 * mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds() {
        assert_eq!(DifficultyLabel::from_percentage(0), DifficultyLabel::Beginner);
        assert_eq!(DifficultyLabel::from_percentage(25), DifficultyLabel::Beginner);
        assert_eq!(DifficultyLabel::from_percentage(26), DifficultyLabel::Intermediate);
        assert_eq!(DifficultyLabel::from_percentage(50), DifficultyLabel::Intermediate);
        assert_eq!(DifficultyLabel::from_percentage(75), DifficultyLabel::Advanced);
        assert_eq!(DifficultyLabel::from_percentage(76), DifficultyLabel::Expert);
        assert_eq!(describe(100), "expert level");
    }

    #[test]
    fn test_escalation_caps_at_100() {
        assert_eq!(escalate(50), 75);
        assert_eq!(escalate(90), 100);
        assert_eq!(escalate(255), 100);
    }

    #[test]
    fn test_level_band() {
        assert_eq!(LevelBand::from_proficiency(0), LevelBand::Basic);
        assert_eq!(LevelBand::from_proficiency(1), LevelBand::Intermediate);
        assert_eq!(LevelBand::from_proficiency(3), LevelBand::Advanced);
    }

    #[test]
    fn test_preferred_difficulty() {
        let mut profile = KnowledgeProfile::default();
        let interests = vec!["JavaScript".to_string()];
        assert_eq!(preferred_difficulty(&profile, &interests, 50), 50);

        profile.insert("JavaScript", "Variables", 2, 0.9, None);
        profile.insert("JavaScript", "Functions", 1, 0.6, None);
        // mean 1.5 -> 62.5 -> 63
        assert_eq!(preferred_difficulty(&profile, &interests, 50), 63);

        // Entries outside the learner's interests are ignored
        let other = vec!["Cooking".to_string()];
        assert_eq!(preferred_difficulty(&profile, &other, 40), 40);
    }

    #[test]
    fn test_clamp_percentage() {
        assert_eq!(clamp_percentage(-5.0), 0);
        assert_eq!(clamp_percentage(49.6), 50);
        assert_eq!(clamp_percentage(300.0), 100);
        assert_eq!(clamp_percentage(f64::NAN), 0);
    }
}
