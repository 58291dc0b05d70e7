use super::NewContent;

/// (topic, type, granularity, content)
type SampleRow = (&'static str, &'static str, &'static str, &'static str);

static SAMPLES: &[SampleRow] = &[
    (
        "JavaScript",
        "info",
        "high",
        "In JavaScript, `let` and `const` are block-scoped, while `var` is function-scoped. This means `let` and `const` are only accessible within the block they are declared.",
    ),
    (
        "JavaScript",
        "quiz",
        "high",
        "What is the difference between `==` and `===` in JavaScript?",
    ),
    (
        "JavaScript",
        "explanation",
        "high",
        "The `===` operator checks both value and type, while `==` only checks value after type coercion.",
    ),
    (
        "Cooking",
        "tip",
        "high",
        "Preheating your pan with a thin layer of oil prevents ingredients from sticking better than adding food to a cold pan.",
    ),
    ("Cooking", "tip", "low", "Salt enhances the natural flavors of ingredients."),
    ("History", "info", "low", "World War II lasted from 1939 to 1945."),
    (
        "History",
        "info",
        "high",
        "The Battle of Stalingrad (1942-1943) was a turning point in WWII, where Soviet forces encircled and defeated the German 6th Army.",
    ),
    (
        "Philosophy",
        "info",
        "low",
        "Ethics is the branch of philosophy that deals with moral principles.",
    ),
    (
        "Philosophy",
        "info",
        "high",
        "Kant's categorical imperative states: \"Act only according to that maxim whereby you can at the same time will that it should become a universal law.\"",
    ),
];

const EQUALITY_OPTIONS: &[&str] = &["== (loose equality)", "=== (strict equality)", "No difference"];

pub(super) fn sample_content() -> Vec<NewContent> {
    SAMPLES
        .iter()
        .map(|(topic, kind, granularity, content)| {
            let mut item = NewContent {
                topic: topic.to_string(),
                content: content.to_string(),
                kind: kind.to_string(),
                granularity: granularity.to_string(),
                difficulty: 25,
                ..NewContent::default()
            };
            if *kind == "quiz" {
                item.options = EQUALITY_OPTIONS.iter().map(|o| o.to_string()).collect();
                item.correct_answer = Some(1);
            }
            item
        })
        .collect()
}
