//! Common test utilities: survey graph fixtures and answer generators.
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use survey_flow::prelude::*;

/// One choice question branching on the chosen value.
///
/// Logic: `likes_art == "yes"` -> b1, otherwise -> b2; both end at `end`.
#[allow(dead_code)]
pub const ART_SURVEY_JSON: &str = r#"{
    "startBlockId": "q1",
    "title": "Art preferences",
    "blocks": [
        {
            "id": "q1",
            "kind": "single-choice",
            "prompt": "Do you like art?",
            "variable": "likes_art",
            "options": [
                {"id": "yes", "label": "Yes", "value": "yes"},
                {"id": "no", "label": "No", "value": "no"}
            ],
            "next": {
                "if": [{"when": {"variable": "likes_art", "equals": "yes"}, "goto": "b1"}],
                "else": "b2"
            }
        },
        {"id": "b1", "kind": "text-input", "prompt": "Favourite artist?", "variable": "artist", "next": "end"},
        {"id": "b2", "kind": "text-input", "prompt": "Why not?", "variable": "reason", "next": "end"},
        {"id": "end", "kind": "final", "content": "Thanks!"}
    ]
}"#;

/// Option ids differ from their values; both branches end the survey.
#[allow(dead_code)]
pub const LIKES_ART_JSON: &str = r#"{
    "start": "b0",
    "blocks": [
        {
            "id": "b0",
            "kind": "single-choice",
            "variable": "likes_art",
            "options": [
                {"id": "y", "label": "Yes", "value": "yes"},
                {"id": "n", "label": "No", "value": "no"}
            ],
            "next": {
                "if": [{"when": {"variable": "likes_art", "equals": "yes"}, "goto": "b1"}],
                "else": "b2"
            }
        },
        {"id": "b1", "kind": "final"},
        {"id": "b2", "kind": "final"}
    ]
}"#;

/// A numeric threshold on a free-text answer.
///
/// Logic: `age > 100` -> old, otherwise -> other.
#[allow(dead_code)]
pub const AGE_SURVEY_JSON: &str = r#"{
    "startBlockId": "age_q",
    "blocks": [
        {
            "id": "age_q",
            "kind": "text-input",
            "prompt": "How old are you?",
            "variable": "age",
            "next": {
                "if": [{"when": {"variable": "age", "gt": 100}, "goto": "old"}],
                "else": "other"
            }
        },
        {"id": "old", "kind": "message", "content": "Impressive!", "next": "end"},
        {"id": "other", "kind": "message", "content": "Thanks.", "next": "end"},
        {"id": "end", "kind": "final"}
    ]
}"#;

/// `b0.next` points at a block that does not exist.
#[allow(dead_code)]
pub const DANGLING_SURVEY_JSON: &str = r#"{
    "startBlockId": "b0",
    "blocks": [
        {"id": "b0", "kind": "message", "content": "Hello", "next": "zz"},
        {"id": "end", "kind": "final"}
    ]
}"#;

/// Two blocks nothing transitions to.
#[allow(dead_code)]
pub const UNREACHABLE_SURVEY_JSON: &str = r#"{
    "startBlockId": "intro",
    "blocks": [
        {"id": "intro", "kind": "message", "content": "Welcome", "next": "end"},
        {"id": "orphan_a", "kind": "message", "content": "Never shown", "next": "end"},
        {"id": "orphan_b", "kind": "message", "content": "Never shown either", "next": "orphan_a"},
        {"id": "end", "kind": "final"}
    ]
}"#;

/// Every block kind, several conditional branches, two final blocks.
///
/// Estimated at 250 s (5 minutes), matching the declared duration.
#[allow(dead_code)]
pub const FULL_SURVEY_JSON: &str = r#"{
    "start": "welcome",
    "title": "Customer profile",
    "expectedMinutes": 5,
    "blocks": [
        {"id": "welcome", "kind": "message", "content": "Welcome!", "next": "name"},
        {"id": "name", "kind": "text-input", "prompt": "Your name?", "variable": "name",
         "maxLength": 40, "next": "age"},
        {"id": "age", "kind": "number-input", "prompt": "Your age?", "variable": "age",
         "min": 0, "max": 120,
         "next": {"if": [{"when": {"variable": "age", "lt": 18}, "goto": "minor_end"}],
                  "else": "colors"}},
        {"id": "colors", "kind": "multi-choice", "prompt": "Favourite colours?", "variable": "colors",
         "maxSelections": 2,
         "options": [
             {"id": "red", "label": "Red", "value": "red"},
             {"id": "green", "label": "Green", "value": "green"},
             {"id": "blue", "label": "Blue", "value": "blue"}
         ],
         "next": {"if": [{"when": {"variable": "colors", "in": ["red", "blue"]}, "goto": "rating"}],
                  "else": "pet"}},
        {"id": "pet", "kind": "single-choice", "prompt": "Pet?", "variable": "pet",
         "options": [
             {"id": "cat", "label": "Cat", "value": "cat"},
             {"id": "dog", "label": "Dog", "value": "dog"},
             {"id": "none", "label": "None", "value": "none"}
         ],
         "next": {"if": [{"when": {"equals": "none"}, "goto": "consent"}], "else": "rating"}},
        {"id": "rating", "kind": "scale", "prompt": "Rate us", "variable": "rating",
         "options": [
             {"id": "r1", "label": "1", "value": 1},
             {"id": "r2", "label": "2", "value": 2},
             {"id": "r3", "label": "3", "value": 3},
             {"id": "r4", "label": "4", "value": 4},
             {"id": "r5", "label": "5", "value": 5}
         ],
         "next": {"if": [{"when": {"variable": "rating", "gt": 3}, "goto": "video"}],
                  "else": "contact"}},
        {"id": "video", "kind": "video", "prompt": "Tell us more on camera", "variable": "clip",
         "next": "contact"},
        {"id": "contact", "kind": "contact-form", "prompt": "How can we reach you?", "variable": "contact",
         "fields": [
             {"id": "email", "label": "Email"},
             {"id": "phone", "label": "Phone", "required": false}
         ],
         "next": "demo"},
        {"id": "demo", "kind": "demographics", "prompt": "About you", "variable": "demo",
         "fields": ["country"], "next": "consent"},
        {"id": "consent", "kind": "yes-no", "prompt": "May we follow up?", "variable": "consent",
         "next": {"if": [{"when": {"variable": "consent", "equals": true}, "goto": "end"}],
                  "else": "end"}},
        {"id": "minor_end", "kind": "final", "content": "Sorry, adults only."},
        {"id": "end", "kind": "final", "content": "Thanks!"}
    ]
}"#;

/// A question that may send the respondent back to itself.
///
/// Logic: `retry == "again"` -> ask, otherwise -> end.
#[allow(dead_code)]
pub const RETRY_SURVEY_JSON: &str = r#"{
    "start": "ask",
    "blocks": [
        {"id": "ask", "kind": "text-input", "variable": "retry",
         "next": {"if": [{"when": {"equals": "again"}, "goto": "ask"}], "else": "end"}},
        {"id": "end", "kind": "final"}
    ]
}"#;

#[allow(dead_code)]
pub fn load(json: &str) -> Graph {
    Graph::from_json(json).expect("fixture graph should normalize")
}

/// Starts a session on a fixture with the default interpreter.
#[allow(dead_code)]
pub fn start(json: &str) -> (Interpreter, Session) {
    let interpreter = Interpreter::default();
    let session = interpreter
        .start_session(Arc::new(load(json)))
        .expect("fixture graph should be valid");
    (interpreter, session)
}

/// Builds a block by hand, for graphs the normalizer would reject.
#[allow(dead_code)]
pub fn block(id: &str, kind: BlockKind, variable: Option<&str>, next: Option<Transition>) -> Block {
    Block {
        id: id.to_string(),
        kind,
        prompt: None,
        variable: variable.map(str::to_string),
        next,
    }
}

#[allow(dead_code)]
pub fn goto(target: &str) -> Option<Transition> {
    Some(Transition::Direct(target.to_string()))
}

/// Produces an answer the block accepts.
#[allow(dead_code)]
pub fn random_answer(block: &Block, rng: &mut StdRng) -> Value {
    match &block.kind {
        BlockKind::Message | BlockKind::Final | BlockKind::Unrecognized { .. } => Value::Null,
        BlockKind::TextInput { .. } => Value::from(format!("text-{}", rng.random_range(0..1000))),
        BlockKind::NumberInput { min, max } => {
            let low = min.unwrap_or(0.0) as i64;
            let high = max.unwrap_or(100.0) as i64;
            Value::Number(rng.random_range(low..=high) as f64)
        }
        BlockKind::SingleChoice { options } | BlockKind::Scale { options } => {
            let option = &options[rng.random_range(0..options.len())];
            Value::from(option.id.as_str())
        }
        BlockKind::MultiChoice {
            options,
            max_selections,
        } => {
            let limit = max_selections.unwrap_or(options.len());
            let count = rng.random_range(1..=limit);
            let offset = rng.random_range(0..options.len());
            Value::List(
                (0..count)
                    .map(|i| Value::from(options[(offset + i) % options.len()].id.as_str()))
                    .collect(),
            )
        }
        BlockKind::YesNo => Value::Bool(rng.random_bool(0.5)),
        BlockKind::Video { .. } => Value::from(format!("clip-{}", rng.random_range(0..1000))),
        BlockKind::ContactForm { fields } | BlockKind::Demographics { fields } => {
            let record: BTreeMap<String, Value> = fields
                .iter()
                .map(|field| {
                    let value = if field.id == "email" {
                        "someone@example.com".to_string()
                    } else {
                        format!("{}-value", field.id)
                    };
                    (field.id.clone(), Value::from(value))
                })
                .collect();
            Value::Record(record)
        }
    }
}
