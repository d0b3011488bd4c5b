use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A value stored in a session's variable store, or used as a condition operand.
///
/// The derived serde representation is externally tagged so that session
/// snapshots round-trip through non-self-describing formats. JSON-facing
/// output goes through [`serde_json::Value`] instead (see [`plain`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

// Manual implementation to handle f64
impl Eq for Value {}

impl Value {
    /// Reads the value as a finite number. Numeric strings are parsed.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Reads the value as a boolean. Accepts "true"/"false"/"yes"/"no" text.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Text(s) => parse_bool(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compares two primitive values after normalizing `self` to the type of
    /// `operand`. Lists and records only compare structurally.
    pub fn loosely_equals(&self, operand: &Value) -> bool {
        match operand {
            Value::Number(n) => self.as_number().is_some_and(|v| v == *n),
            Value::Bool(b) => self.as_bool() == Some(*b),
            Value::Text(s) => match self {
                Value::Text(v) => v == s,
                Value::Number(_) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .is_some_and(|parsed| self.as_number() == Some(parsed)),
                Value::Bool(b) => parse_bool(s) == Some(*b),
                _ => false,
            },
            Value::Null => self.is_null(),
            Value::List(_) | Value::Record(_) => self == operand,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                // Integers above 2^53 are not exact in f64.
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Null => write!(f, "null"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (key, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(key, item)| (key, Value::from(item)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(key, item)| (key.clone(), serde_json::Value::from(item)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Serializes a `Value` as plain JSON (`"yes"` rather than `{"Text":"yes"}`).
pub fn plain<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    serde_json::Value::from(value).serialize(serializer)
}

/// Plain-JSON serialization for a slice of values.
pub fn plain_list<S: Serializer>(values: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
    serde_json::Value::Array(values.iter().map(serde_json::Value::from).collect())
        .serialize(serializer)
}

/// A session's variable store: variable name to last written value.
pub type Variables = ahash::AHashMap<String, Value>;
