//! Prompt templates sent to the model.

use schemars::schema_for;
use serde::Serialize;

use super::types::{Lesson, Recommendation};
use crate::engine::difficulty::describe;
use crate::engine::hierarchy::{HierarchyRecommendation, RelatedConcept};
use crate::engine::profile::LearningApproach;
use crate::engine::KnowledgeProfile;

const JSON_ONLY: &str = "Return ONLY valid JSON. No explanations, no markdown, no additional text.";

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

/// Wording guidance for a stored granularity preference.
pub fn granularity_hint(granularity: &str) -> &'static str {
    match granularity {
        "high" => "Use precise, technical wording with exact terminology.",
        "flexible" | "low" => "Use simplified, everyday wording and avoid jargon.",
        _ => "Choose whatever level of technical detail fits the concept best.",
    }
}

/// JSON schema of [`Lesson`], embedded so the model knows the exact shape.
pub fn lesson_schema() -> String {
    serde_json::to_string_pretty(&schema_for!(Lesson)).unwrap_or_default()
}

pub fn interest_analysis(raw_input: &str, profile: &serde_json::Value) -> String {
    format!(
        r#"You are an AI learning analyst. Analyze this user's learning interests.

User Input: "{raw_input}"

User Profile Data: {profile}

Analyze the input for:
1. Learning topics and subjects mentioned (languages, frameworks, tools, concepts, hobbies)
2. Confidence level and enthusiasm indicators
3. Priority levels (main focus vs side interests)
4. Difficulty hints and skill level indicators

Extract ALL topics mentioned.

Return this JSON structure:
{{
  "analysis": {{
    "overallTone": "confident|uncertain|enthusiastic|hesitant",
    "confidenceLevel": 50,
    "learningStyle": "structured|exploratory|practical|theoretical",
    "learningProportions": {{
      "primaryFocus": "main learning area",
      "secondaryAreas": ["side interest"],
      "learningRatio": "e.g., 70% primary, 30% secondary"
    }}
  }},
  "categories": [
    {{
      "name": "Category Name",
      "topics": ["Topic"],
      "difficulty": 50,
      "confidence": 50,
      "priority": "primary|secondary|tertiary",
      "proportion": 50,
      "frequency": "daily|weekly|occasionally",
      "reasoning": "Why this difficulty/confidence/priority level"
    }}
  ],
  "recommendations": {{
    "startingPoint": "suggested first topic",
    "learningPath": "recommended progression",
    "focusAreas": ["area"],
    "learningSchedule": {{
      "primaryFocus": "focus description",
      "secondaryAreas": "secondary description",
      "balance": "balance description"
    }}
  }}
}}

{JSON_ONLY}"#,
        profile = to_json(profile),
    )
}

pub fn learning_content(topic: &str, concept: &str, difficulty: u8) -> String {
    format!(
        "Generate personalized learning content for:\n\
         \n\
         Topic: {topic}\n\
         Concept: {concept}\n\
         Difficulty: {difficulty}% (0-100 scale, {level})\n\
         \n\
         Create engaging, bite-sized content that:\n\
         - Matches the difficulty level exactly\n\
         - Is interactive and educational\n\
         - Builds on the user's existing knowledge\n\
         \n\
         Format as JSON with:\n\
         - content: The learning content\n\
         - type: \"info\", \"quiz\" or \"tip\"\n\
         - difficulty: {difficulty}\n\
         - if quiz: options array, correctAnswer index and correctAnswerText\n\
         \n\
         {JSON_ONLY}",
        level = describe(difficulty),
    )
}

pub fn response_analysis(
    answer: &str,
    topic: &str,
    concept: &str,
    correct_answer: Option<&str>,
) -> String {
    let correct = correct_answer
        .map(|c| format!("Correct Answer: \"{}\"\n", c))
        .unwrap_or_default();
    format!(
        "Analyze this user's learning response:\n\
         \n\
         Topic: {topic}\n\
         Concept: {concept}\n\
         User Response: \"{answer}\"\n\
         {correct}\n\
         Provide analysis as JSON:\n\
         - isCorrect: boolean\n\
         - difficultyLevel: percentage (0-100) based on response sophistication\n\
         - confidence: 0.0-1.0\n\
         - feedback: encouraging message\n\
         - suggestions: array of next learning topics\n\
         - adjustedDifficulty: suggested difficulty percentage for next content\n\
         \n\
         {JSON_ONLY}"
    )
}

pub struct EscalationBrief<'a> {
    pub topic: &'a str,
    pub concept: &'a str,
    pub current: u8,
    pub escalated: u8,
    pub recommendation: &'a Recommendation,
    pub hierarchy: &'a HierarchyRecommendation,
}

pub fn escalation(brief: &EscalationBrief<'_>) -> String {
    format!(
        "The user found the previous content too easy and has mastered the basic concept. \
         Generate more challenging content for:\n\
         \n\
         Topic: {topic}\n\
         Concept: {concept} (user has mastered the basics)\n\
         Current Difficulty: {current}%\n\
         New Difficulty: {escalated}%\n\
         \n\
         AI Recommendation: {recommendation}\n\
         Hierarchical Content: {hierarchy}\n\
         \n\
         Create content that:\n\
         - Goes beyond the fundamentals\n\
         - Introduces advanced techniques or edge cases\n\
         - Requires deeper understanding and application\n\
         - Respects the difficulty percentage: {escalated}% means {level}\n\
         \n\
         Format as JSON with:\n\
         - content: Advanced learning content\n\
         - type: \"info\", \"quiz\" or \"tip\"\n\
         - topic: {topic}\n\
         - concept: Advanced concept name\n\
         - difficulty: {escalated}\n\
         - if quiz: options array, correctAnswer index and correctAnswerText\n\
         - reasoning: Why this advanced content was chosen\n\
         \n\
         {JSON_ONLY}",
        topic = brief.topic,
        concept = brief.concept,
        current = brief.current,
        escalated = brief.escalated,
        recommendation = to_json(brief.recommendation),
        hierarchy = to_json(brief.hierarchy),
        level = describe(brief.escalated),
    )
}

pub fn recommendations(interests: &[String], profile: &KnowledgeProfile) -> String {
    format!(
        "Based on the user's interests and knowledge profile, generate personalized learning recommendations:\n\
         \n\
         Interests: {interests}\n\
         Knowledge Profile: {profile}\n\
         \n\
         Generate 3-5 suggestions as a JSON array of objects with:\n\
         - topic: Learning topic\n\
         - concept: Specific concept to learn\n\
         - difficulty: 1-5 scale\n\
         - reason: Why this is recommended for this user\n\
         \n\
         {JSON_ONLY}",
        interests = join_or(interests, "Not specified"),
        profile = to_json(profile),
    )
}

pub struct LessonBrief<'a> {
    pub interests: &'a [String],
    pub profile: &'a KnowledgeProfile,
    pub difficulty: u8,
    pub granularity: &'a str,
    pub recommendation: &'a Recommendation,
    pub decision: &'a super::types::ContextDecision,
    pub approach: &'a LearningApproach,
    pub related: &'a [RelatedConcept],
    pub ready: &'a [String],
}

pub fn personalized_lesson(brief: &LessonBrief<'_>) -> String {
    let interests = join_or(brief.interests, "None specified");
    let related = if brief.related.is_empty() {
        "None yet".to_string()
    } else {
        brief
            .related
            .iter()
            .map(|r| format!("{} ({})", r.concept, r.topic))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let approach_name = to_json(&brief.approach.approach).trim_matches('"').to_string();

    format!(
        r#"Generate a personalized micro-learning lesson based on the user's profile:

User Interests: {interests}
Knowledge Profile: {profile}
Preferences: difficulty {difficulty}%, granularity {granularity}

AI Recommendation: {recommendation}
Context Decision: {decision}
Learning Approach: {approach}
Related concepts to consider: {related}
Concepts ready to learn next: {ready}

Focus ONLY on the user's specific interests: {interests}

Use the hierarchical topic system to determine content:
- If the user knows the concept in another topic: focus on SYNTAX differences
- If the user is new to the concept: focus on CONCEPTUAL understanding
- Respect the difficulty percentage: {difficulty}% means {level}
- {granularity_hint}

Generate a lesson that:
- Focuses on ONE of the user's interests
- Builds on their existing knowledge
- Uses the approach above ({approach_name})
- Is engaging and bite-sized (1-2 sentences)
- Never falls back to generic "core skills" content

For quizzes include exactly 4 options, correctAnswer as the index (0-3) and correctAnswerText.

The reply must match this JSON schema:
{schema}

Example quiz:
{{
  "content": "What is the correct HTML tag for a paragraph?",
  "type": "quiz",
  "topic": "HTML Basics",
  "concept": "HTML Elements",
  "difficulty": 50,
  "options": ["<p>", "<para>", "<paragraph>", "<text>"],
  "correctAnswer": 0,
  "correctAnswerText": "<p>",
  "reasoning": "Basic HTML knowledge for web development"
}}

{JSON_ONLY}"#,
        profile = to_json(brief.profile),
        difficulty = brief.difficulty,
        granularity = brief.granularity,
        recommendation = to_json(brief.recommendation),
        decision = to_json(brief.decision),
        approach = brief.approach.reasoning,
        ready = join_or(brief.ready, "None"),
        level = describe(brief.difficulty),
        granularity_hint = granularity_hint(brief.granularity),
        schema = lesson_schema(),
    )
}

pub fn organize_topics(interests: &[String], profile: &serde_json::Value) -> String {
    format!(
        r#"You are a learning topic organizer. Based on the user's interests, create a flexible topic structure.

User Interests: {interests}
User Profile: {profile}

Create a topic structure that:
1. Organizes the user's interests into logical categories
2. Identifies key concepts within each category
3. Suggests learning progression paths
4. Adapts to any subject matter (not just programming)

Return JSON structure:
{{
  "categories": [
    {{
      "name": "Category Name",
      "description": "What this category covers",
      "topics": [
        {{
          "name": "Topic Name",
          "description": "What this topic covers",
          "concepts": ["concept1", "concept2"],
          "difficulty": "Basic|Intermediate|Advanced|Expert",
          "prerequisites": ["required knowledge"],
          "learningPath": "suggested progression"
        }}
      ]
    }}
  ],
  "learningPaths": [
    {{ "name": "Path Name", "description": "Learning progression", "steps": ["step1", "step2"] }}
  ]
}}

{JSON_ONLY}"#,
        interests = join_or(interests, "Not specified"),
        profile = to_json(profile),
    )
}

pub fn recommend_next(
    knowledge: &KnowledgeProfile,
    interests: &[String],
    current_topic: Option<&str>,
    structure: &super::types::TopicStructure,
) -> String {
    format!(
        r#"Based on the user's knowledge profile and interests, recommend the next learning content.

User Knowledge Profile: {knowledge}
User Interests: {interests}
Current Topic: {current}
Available Topics: {structure}

Analyze the user's knowledge gaps and recommend:
1. What topic/concept to learn next
2. What difficulty level is appropriate
3. Why this recommendation makes sense

Return JSON:
{{
  "recommendedTopic": "topic name",
  "recommendedConcept": "concept name",
  "difficultyLevel": "Basic|Intermediate|Advanced|Expert",
  "reasoning": "why this is the right next step",
  "learningPath": "how this fits into their learning journey"
}}

{JSON_ONLY}"#,
        knowledge = to_json(knowledge),
        interests = join_or(interests, "Not specified"),
        current = current_topic.unwrap_or("Any"),
        structure = to_json(structure),
    )
}

pub fn context_decision(profile: &serde_json::Value, concept: &str, new_context: &str) -> String {
    format!(
        r#"Should the user learn "{concept}" in the context of "{new_context}"?

User Profile: {profile}
Concept: {concept}
New Context: {new_context}

Consider:
1. User's current knowledge level
2. Whether they've mastered the concept in other contexts
3. If learning in this new context would be beneficial
4. If it's too advanced or too basic

Return JSON:
{{
  "shouldLearn": true,
  "reasoning": "why or why not",
  "difficultyAdjustment": "easier|same|harder",
  "prerequisites": ["what they need to know first"]
}}

{JSON_ONLY}"#,
        profile = to_json(profile),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_hints() {
        assert!(granularity_hint("high").contains("technical"));
        assert_eq!(granularity_hint("low"), granularity_hint("flexible"));
        assert!(granularity_hint("auto").contains("Choose"));
    }

    #[test]
    fn test_lesson_schema_names_fields() {
        let schema = lesson_schema();
        assert!(schema.contains("\"content\""));
        assert!(schema.contains("\"correctAnswerText\""));
        assert!(schema.contains("\"type\""));
    }

    #[test]
    fn test_response_analysis_optional_answer() {
        let with =
            response_analysis("a closure", "JavaScript", "Closures", Some("function + scope"));
        assert!(with.contains("Correct Answer: \"function + scope\""));
        let without = response_analysis("a closure", "JavaScript", "Closures", None);
        assert!(!without.contains("Correct Answer"));
    }

    #[test]
    fn test_content_prompt_mentions_level() {
        let prompt = learning_content("Python", "Loops", 80);
        assert!(prompt.contains("80% (0-100 scale, expert level)"));
    }
}
