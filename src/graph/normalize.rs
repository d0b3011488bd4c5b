use super::{Block, BlockKind, ChoiceOption, Condition, FormField, Graph, Predicate, Rule, Transition};
use crate::error::{BlockIssue, GraphError};
use crate::value::Value;
use ahash::AHashMap;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use tracing::debug;

/// The top-level shape of a survey graph document.
///
/// Blocks stay as raw JSON until normalization so that every broken block can
/// be reported at once instead of failing on the first one.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawGraph {
    #[serde(default, alias = "startBlockId", alias = "start_block_id")]
    pub start: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "expectedMinutes",
        alias = "expected_duration",
        alias = "expectedDuration"
    )]
    pub expected_minutes: Option<f64>,
    #[serde(default)]
    pub blocks: Vec<Json>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindTag {
    Message,
    TextInput,
    NumberInput,
    SingleChoice,
    MultiChoice,
    Scale,
    YesNo,
    Video,
    ContactForm,
    Demographics,
    Final,
}

impl KindTag {
    fn from_canonical(name: &str) -> Option<Self> {
        Some(match name {
            "message" => KindTag::Message,
            "text-input" => KindTag::TextInput,
            "number-input" => KindTag::NumberInput,
            "single-choice" => KindTag::SingleChoice,
            "multi-choice" => KindTag::MultiChoice,
            "scale" => KindTag::Scale,
            "yes-no" => KindTag::YesNo,
            "video" => KindTag::Video,
            "contact-form" => KindTag::ContactForm,
            "demographics" => KindTag::Demographics,
            "final" => KindTag::Final,
            _ => return None,
        })
    }
}

/// Spellings used by common flow editors, mapped onto the canonical kinds.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("statement", "message"),
    ("info", "message"),
    ("welcome", "message"),
    ("text", "text-input"),
    ("open-text", "text-input"),
    ("free-text", "text-input"),
    ("number", "number-input"),
    ("numeric", "number-input"),
    ("choice", "single-choice"),
    ("radio", "single-choice"),
    ("multiple-choice", "multi-choice"),
    ("checkbox", "multi-choice"),
    ("rating", "scale"),
    ("likert", "scale"),
    ("nps", "scale"),
    ("yesno", "yes-no"),
    ("boolean", "yes-no"),
    ("video-response", "video"),
    ("contact", "contact-form"),
    ("demographic", "demographics"),
    ("end", "final"),
    ("thank-you", "final"),
    ("thanks", "final"),
];

const CANONICAL_KINDS: &[&str] = &[
    "message",
    "text-input",
    "number-input",
    "single-choice",
    "multi-choice",
    "scale",
    "yes-no",
    "video",
    "contact-form",
    "demographics",
    "final",
];

const CONDITION_OPERATORS: &[&str] = &["equals", "in", "gt", "lt"];

/// Converts raw graph JSON into a typed [`Graph`], rejecting structurally
/// broken input with [`GraphError::MalformedGraph`].
pub struct Normalizer {
    kinds: AHashMap<String, KindTag>,
}

pub struct NormalizerBuilder {
    kinds: AHashMap<String, KindTag>,
}

impl NormalizerBuilder {
    pub fn new() -> Self {
        let mut kinds = AHashMap::new();
        for name in CANONICAL_KINDS {
            if let Some(tag) = KindTag::from_canonical(name) {
                kinds.insert(name.to_string(), tag);
            }
        }
        for (alias, canonical) in DEFAULT_ALIASES {
            if let Some(tag) = KindTag::from_canonical(canonical) {
                kinds.insert(alias.to_string(), tag);
            }
        }
        Self { kinds }
    }

    /// Maps a custom kind spelling onto a canonical kind. Unknown canonical
    /// names are ignored.
    pub fn with_kind_alias(mut self, alias: &str, canonical: &str) -> Self {
        if let Some(tag) = KindTag::from_canonical(canonical) {
            self.kinds.insert(normalize_kind_key(alias), tag);
        }
        self
    }

    pub fn build(self) -> Normalizer {
        Normalizer { kinds: self.kinds }
    }
}

impl Default for NormalizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        NormalizerBuilder::new().build()
    }
}

/// Lowercases and folds `_`, spaces and camelCase humps into `-`.
fn normalize_kind_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 4);
    for (i, c) in name.trim().chars().enumerate() {
        if c == '_' || c == ' ' {
            key.push('-');
        } else if c.is_ascii_uppercase() {
            if i > 0 && !key.ends_with('-') {
                key.push('-');
            }
            key.push(c.to_ascii_lowercase());
        } else {
            key.push(c);
        }
    }
    key
}

impl Normalizer {
    pub fn builder() -> NormalizerBuilder {
        NormalizerBuilder::new()
    }

    /// Normalizes a graph document given as a JSON value.
    ///
    /// A bare array is accepted as the block list of a graph without an
    /// explicit start block.
    pub fn normalize_json(&self, json: Json) -> Result<Graph, GraphError> {
        let raw = match json {
            Json::Array(blocks) => RawGraph {
                blocks,
                ..RawGraph::default()
            },
            Json::Object(_) => serde_json::from_value::<RawGraph>(json)
                .map_err(|e| malformed_graph(format!("invalid graph document: {}", e)))?,
            other => {
                return Err(malformed_graph(format!(
                    "expected a JSON object, found {}",
                    json_type(&other)
                )));
            }
        };
        self.normalize(raw)
    }

    pub fn normalize_str(&self, json: &str) -> Result<Graph, GraphError> {
        let json: Json =
            serde_json::from_str(json).map_err(|e| GraphError::JsonParseError(e.to_string()))?;
        self.normalize_json(json)
    }

    /// Normalizes a parsed [`RawGraph`], listing every broken block on failure.
    pub fn normalize(&self, raw: RawGraph) -> Result<Graph, GraphError> {
        let mut issues = Vec::new();
        let mut blocks = Vec::with_capacity(raw.blocks.len());

        if raw.blocks.is_empty() {
            issues.push(BlockIssue {
                block_id: None,
                index: None,
                message: "graph has no blocks".to_string(),
            });
        }

        for (index, raw_block) in raw.blocks.iter().enumerate() {
            if let Some(block) = self.normalize_block(index, raw_block, &mut issues) {
                blocks.push(block);
            }
        }

        for id in blocks.iter().map(|b| b.id.as_str()).duplicates() {
            issues.push(BlockIssue {
                block_id: Some(id.to_string()),
                index: None,
                message: "duplicate block id".to_string(),
            });
        }

        if !issues.is_empty() {
            debug!(issues = issues.len(), "rejected malformed survey graph");
            return Err(GraphError::MalformedGraph { issues });
        }

        let start = match raw.start {
            Some(start) => start,
            // Non-empty: an empty block list was reported above.
            None => blocks[0].id.clone(),
        };

        let mut graph = Graph::new(start, blocks)?;
        if let Some(title) = raw.title {
            graph = graph.with_title(title);
        }
        if let Some(minutes) = raw.expected_minutes {
            graph = graph.with_expected_minutes(minutes);
        }
        debug!(
            blocks = graph.len(),
            start = graph.start_block_id(),
            "normalized survey graph"
        );
        Ok(graph)
    }

    fn resolve_kind(&self, name: &str) -> Option<KindTag> {
        self.kinds
            .get(name)
            .or_else(|| self.kinds.get(&normalize_kind_key(name)))
            .copied()
    }

    fn normalize_block(
        &self,
        index: usize,
        raw: &Json,
        issues: &mut Vec<BlockIssue>,
    ) -> Option<Block> {
        let Some(obj) = raw.as_object() else {
            issues.push(BlockIssue {
                block_id: None,
                index: Some(index),
                message: format!("expected a JSON object, found {}", json_type(raw)),
            });
            return None;
        };

        let id = obj.get("id").and_then(scalar_string);
        let kind_name = obj
            .get("kind")
            .or_else(|| obj.get("type"))
            .and_then(Json::as_str);

        let mut problems = Vec::new();
        if id.is_none() {
            problems.push("missing string field 'id'".to_string());
        }
        if kind_name.is_none() {
            problems.push("missing string field 'kind'".to_string());
        }

        let variable = obj
            .get("variable")
            .and_then(Json::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let prompt = ["prompt", "content", "text", "question"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Json::as_str))
            .map(str::to_string);

        let next = match obj.get("next") {
            None | Some(Json::Null) => None,
            Some(raw_next) => match parse_transition(raw_next, variable.as_deref()) {
                Ok(transition) => Some(transition),
                Err(message) => {
                    problems.push(format!("invalid 'next': {}", message));
                    None
                }
            },
        };

        let kind = match kind_name {
            Some(name) => match self.resolve_kind(name) {
                Some(tag) => match build_kind(tag, obj) {
                    Ok(kind) => Some(kind),
                    Err(mut kind_problems) => {
                        problems.append(&mut kind_problems);
                        None
                    }
                },
                None => Some(BlockKind::Unrecognized {
                    name: name.to_string(),
                }),
            },
            None => None,
        };

        if !problems.is_empty() {
            issues.extend(problems.into_iter().map(|message| BlockIssue {
                block_id: id.clone(),
                index: Some(index),
                message,
            }));
            return None;
        }

        Some(Block {
            id: id?,
            kind: kind?,
            prompt,
            variable,
            next,
        })
    }
}

fn build_kind(tag: KindTag, obj: &Map<String, Json>) -> Result<BlockKind, Vec<String>> {
    let mut problems = Vec::new();
    let kind = match tag {
        KindTag::Message => BlockKind::Message,
        KindTag::Final => BlockKind::Final,
        KindTag::YesNo => BlockKind::YesNo,
        KindTag::TextInput => BlockKind::TextInput {
            max_length: optional_count(obj, &["maxLength", "max_length"], &mut problems),
        },
        KindTag::NumberInput => BlockKind::NumberInput {
            min: optional_number(obj, "min", &mut problems),
            max: optional_number(obj, "max", &mut problems),
        },
        KindTag::SingleChoice => BlockKind::SingleChoice {
            options: parse_options(obj, &mut problems),
        },
        KindTag::MultiChoice => BlockKind::MultiChoice {
            options: parse_options(obj, &mut problems),
            max_selections: optional_count(
                obj,
                &["maxSelections", "max_selections"],
                &mut problems,
            ),
        },
        KindTag::Scale => BlockKind::Scale {
            options: parse_options(obj, &mut problems),
        },
        KindTag::Video => BlockKind::Video {
            url: obj
                .get("url")
                .or_else(|| obj.get("videoUrl"))
                .and_then(Json::as_str)
                .map(str::to_string),
        },
        KindTag::ContactForm => BlockKind::ContactForm {
            fields: parse_fields(obj, &mut problems),
        },
        KindTag::Demographics => BlockKind::Demographics {
            fields: parse_fields(obj, &mut problems),
        },
    };
    if problems.is_empty() {
        Ok(kind)
    } else {
        Err(problems)
    }
}

fn parse_options(obj: &Map<String, Json>, problems: &mut Vec<String>) -> Vec<ChoiceOption> {
    let raw_options = match obj.get("options") {
        None | Some(Json::Null) => return Vec::new(),
        Some(Json::Array(items)) => items,
        Some(other) => {
            problems.push(format!(
                "'options' must be an array, found {}",
                json_type(other)
            ));
            return Vec::new();
        }
    };

    let mut options = Vec::with_capacity(raw_options.len());
    for (position, raw) in raw_options.iter().enumerate() {
        match raw {
            Json::String(s) => options.push(ChoiceOption {
                id: s.clone(),
                label: s.clone(),
                value: Value::Text(s.clone()),
            }),
            Json::Object(option) => {
                let Some(id) = option.get("id").and_then(scalar_string) else {
                    problems.push(format!("option #{} is missing 'id'", position));
                    continue;
                };
                let label = option
                    .get("label")
                    .and_then(Json::as_str)
                    .map_or_else(|| id.clone(), str::to_string);
                let value = option
                    .get("value")
                    .cloned()
                    .map_or_else(|| Value::Text(id.clone()), Value::from);
                options.push(ChoiceOption { id, label, value });
            }
            other => problems.push(format!(
                "option #{} must be an object or string, found {}",
                position,
                json_type(other)
            )),
        }
    }
    options
}

fn parse_fields(obj: &Map<String, Json>, problems: &mut Vec<String>) -> Vec<FormField> {
    let Some(raw_fields) = obj.get("fields") else {
        return Vec::new();
    };
    let Some(raw_fields) = raw_fields.as_array() else {
        problems.push(format!(
            "'fields' must be an array, found {}",
            json_type(raw_fields)
        ));
        return Vec::new();
    };

    raw_fields
        .iter()
        .enumerate()
        .filter_map(|(position, raw)| match raw {
            Json::String(s) => Some(FormField {
                id: s.clone(),
                label: s.clone(),
                required: true,
            }),
            Json::Object(field) => match field.get("id").and_then(scalar_string) {
                Some(id) => Some(FormField {
                    label: field
                        .get("label")
                        .and_then(Json::as_str)
                        .map_or_else(|| id.clone(), str::to_string),
                    required: field.get("required").and_then(Json::as_bool).unwrap_or(true),
                    id,
                }),
                None => {
                    problems.push(format!("field #{} is missing 'id'", position));
                    None
                }
            },
            other => {
                problems.push(format!(
                    "field #{} must be an object or string, found {}",
                    position,
                    json_type(other)
                ));
                None
            }
        })
        .collect()
}

fn parse_transition(raw: &Json, block_variable: Option<&str>) -> Result<Transition, String> {
    match raw {
        Json::String(target) if !target.trim().is_empty() => {
            Ok(Transition::Direct(target.clone()))
        }
        Json::String(_) => Err("target id is empty".to_string()),
        Json::Object(obj) => {
            let raw_rules = match obj.get("if") {
                Some(Json::Array(rules)) => rules.as_slice(),
                Some(other) => {
                    return Err(format!("'if' must be an array, found {}", json_type(other)));
                }
                None => &[],
            };
            let otherwise = obj
                .get("else")
                .and_then(Json::as_str)
                .filter(|target| !target.trim().is_empty())
                .ok_or_else(|| "conditional transition has no 'else' target".to_string())?
                .to_string();

            let rules = raw_rules
                .iter()
                .enumerate()
                .map(|(position, raw_rule)| {
                    parse_rule(raw_rule, block_variable)
                        .map_err(|message| format!("rule #{}: {}", position, message))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Transition::Conditional { rules, otherwise })
        }
        other => Err(format!(
            "expected a block id or a conditional object, found {}",
            json_type(other)
        )),
    }
}

fn parse_rule(raw: &Json, block_variable: Option<&str>) -> Result<Rule, String> {
    let obj = raw.as_object().ok_or("rule must be an object")?;
    let when = obj.get("when").ok_or("missing 'when'")?;
    let goto = obj
        .get("goto")
        .and_then(Json::as_str)
        .filter(|target| !target.trim().is_empty())
        .ok_or("missing 'goto' target")?;
    Ok(Rule {
        when: parse_condition(when, block_variable)?,
        goto: goto.to_string(),
    })
}

fn parse_condition(raw: &Json, block_variable: Option<&str>) -> Result<Condition, String> {
    let obj = raw.as_object().ok_or("condition must be an object")?;
    let variable = obj
        .get("variable")
        .and_then(Json::as_str)
        .or(block_variable)
        .ok_or("condition names no variable and the block declares none")?;

    let operators: Vec<&str> = CONDITION_OPERATORS
        .iter()
        .copied()
        .filter(|op| obj.contains_key(*op))
        .collect();
    let op = match operators.as_slice() {
        [op] => *op,
        [] => return Err("condition has no operator (equals, in, gt, lt)".to_string()),
        many => {
            return Err(format!(
                "condition has several operators: {}",
                many.iter().join(", ")
            ));
        }
    };

    let operand = &obj[op];
    let predicate = match op {
        "equals" => Predicate::Equals(Value::from(operand.clone())),
        "in" => match operand {
            Json::Array(items) => {
                Predicate::In(items.iter().cloned().map(Value::from).collect())
            }
            other => return Err(format!("'in' expects an array, found {}", json_type(other))),
        },
        _ => {
            let n = operand
                .as_f64()
                .filter(|n| n.is_finite())
                .ok_or_else(|| format!("'{}' expects a number, found {}", op, operand))?;
            if op == "gt" {
                Predicate::Gt(n)
            } else {
                Predicate::Lt(n)
            }
        }
    };

    Ok(Condition::new(variable, predicate))
}

fn optional_number(obj: &Map<String, Json>, key: &str, problems: &mut Vec<String>) -> Option<f64> {
    match obj.get(key) {
        None | Some(Json::Null) => None,
        Some(raw) => match raw.as_f64() {
            Some(n) => Some(n),
            None => {
                problems.push(format!("'{}' must be a number, found {}", key, json_type(raw)));
                None
            }
        },
    }
}

fn optional_count(
    obj: &Map<String, Json>,
    keys: &[&str],
    problems: &mut Vec<String>,
) -> Option<usize> {
    let (key, raw) = keys
        .iter()
        .find_map(|key| obj.get(*key).map(|raw| (*key, raw)))?;
    match raw {
        Json::Null => None,
        _ => match raw.as_u64() {
            Some(n) => Some(n as usize),
            None => {
                problems.push(format!(
                    "'{}' must be a non-negative integer, found {}",
                    key, raw
                ));
                None
            }
        },
    }
}

/// Ids may be written as strings or numbers.
fn scalar_string(raw: &Json) -> Option<String> {
    match raw {
        Json::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_type(raw: &Json) -> &'static str {
    match raw {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

fn malformed_graph(message: String) -> GraphError {
    GraphError::MalformedGraph {
        issues: vec![BlockIssue {
            block_id: None,
            index: None,
            message,
        }],
    }
}
