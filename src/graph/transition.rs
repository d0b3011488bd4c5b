use crate::value::{self, Value};
use serde::Serialize;
use std::fmt;

/// The typed predicate of a condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    #[serde(serialize_with = "value::plain")]
    Equals(Value),
    #[serde(serialize_with = "value::plain_list")]
    In(Vec<Value>),
    Gt(f64),
    Lt(f64),
}

impl Predicate {
    pub fn symbol(&self) -> &'static str {
        match self {
            Predicate::Equals(_) => "==",
            Predicate::In(_) => "in",
            Predicate::Gt(_) => ">",
            Predicate::Lt(_) => "<",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(v) => write!(f, "== {}", v),
            Predicate::In(set) => write!(f, "in {}", Value::List(set.clone())),
            Predicate::Gt(n) => write!(f, "> {}", Value::Number(*n)),
            Predicate::Lt(n) => write!(f, "< {}", Value::Number(*n)),
        }
    }
}

/// A predicate over one variable of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub variable: String,
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl Condition {
    pub fn new(variable: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            variable: variable.into(),
            predicate,
        }
    }

    pub fn equals(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(variable, Predicate::Equals(value.into()))
    }

    pub fn is_in(variable: impl Into<String>, set: Vec<Value>) -> Self {
        Self::new(variable, Predicate::In(set))
    }

    pub fn gt(variable: impl Into<String>, n: f64) -> Self {
        Self::new(variable, Predicate::Gt(n))
    }

    pub fn lt(variable: impl Into<String>, n: f64) -> Self {
        Self::new(variable, Predicate::Lt(n))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variable, self.predicate)
    }
}

/// One `{when, goto}` arm of a conditional transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub when: Condition,
    pub goto: String,
}

/// The `next` descriptor of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transition {
    Direct(String),
    Conditional {
        #[serde(rename = "if")]
        rules: Vec<Rule>,
        #[serde(rename = "else")]
        otherwise: String,
    },
}

impl Transition {
    /// All targets in declaration order: each rule's `goto`, then `else`.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Transition::Direct(target) => vec![target.as_str()],
            Transition::Conditional { rules, otherwise } => rules
                .iter()
                .map(|rule| rule.goto.as_str())
                .chain(std::iter::once(otherwise.as_str()))
                .collect(),
        }
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        let rules: &[Rule] = match self {
            Transition::Direct(_) => &[],
            Transition::Conditional { rules, .. } => rules,
        };
        rules.iter().map(|rule| &rule.when)
    }
}
