use super::transition::Transition;
use crate::value::{self, Value};
use serde::Serialize;
use std::fmt;

/// One selectable option of a choice or scale block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    /// The value written to the block's variable when this option is chosen.
    #[serde(serialize_with = "value::plain")]
    pub value: Value,
}

impl ChoiceOption {
    /// True if `answer` is this option's id.
    pub fn has_id(&self, answer: &Value) -> bool {
        answer.as_text() == Some(self.id.as_str())
    }

    /// True if `answer` loosely equals this option's value.
    pub fn has_value(&self, answer: &Value) -> bool {
        answer.loosely_equals(&self.value)
    }
}

/// A field collected by a contact-form or demographics block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub required: bool,
}

/// Kind-specific attributes of a block. One variant per block kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BlockKind {
    Message,
    TextInput {
        #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    NumberInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    SingleChoice {
        options: Vec<ChoiceOption>,
    },
    MultiChoice {
        options: Vec<ChoiceOption>,
        #[serde(rename = "maxSelections", skip_serializing_if = "Option::is_none")]
        max_selections: Option<usize>,
    },
    Scale {
        options: Vec<ChoiceOption>,
    },
    YesNo,
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    ContactForm {
        fields: Vec<FormField>,
    },
    Demographics {
        fields: Vec<FormField>,
    },
    Final,
    /// A kind this crate does not know. Kept so the validator can report it.
    Unrecognized {
        name: String,
    },
}

impl BlockKind {
    /// The canonical kind name, as written in graph JSON.
    pub fn name(&self) -> &str {
        match self {
            BlockKind::Message => "message",
            BlockKind::TextInput { .. } => "text-input",
            BlockKind::NumberInput { .. } => "number-input",
            BlockKind::SingleChoice { .. } => "single-choice",
            BlockKind::MultiChoice { .. } => "multi-choice",
            BlockKind::Scale { .. } => "scale",
            BlockKind::YesNo => "yes-no",
            BlockKind::Video { .. } => "video",
            BlockKind::ContactForm { .. } => "contact-form",
            BlockKind::Demographics { .. } => "demographics",
            BlockKind::Final => "final",
            BlockKind::Unrecognized { name } => name,
        }
    }

    /// Question kinds collect an answer and must declare a `variable`.
    pub fn is_question(&self) -> bool {
        !matches!(
            self,
            BlockKind::Message | BlockKind::Final | BlockKind::Unrecognized { .. }
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(self, BlockKind::Final)
    }

    /// Options for the kinds that require them.
    pub fn options(&self) -> Option<&[ChoiceOption]> {
        match self {
            BlockKind::SingleChoice { options }
            | BlockKind::MultiChoice { options, .. }
            | BlockKind::Scale { options } => Some(options),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the survey graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Display text (`prompt` for questions, `content` for messages and final blocks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Transition>,
}

impl Block {
    /// Every block id this block can transition to, in declaration order.
    pub fn targets(&self) -> Vec<&str> {
        self.next.as_ref().map(|t| t.targets()).unwrap_or_default()
    }

    pub fn is_final(&self) -> bool {
        self.kind.is_final()
    }
}
