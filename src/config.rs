use crate::error::ConfigError;
use crate::graph::Normalizer;
use crate::interpreter::{DEFAULT_MAX_SELF_LOOPS, Interpreter};
use crate::validator::{DEFAULT_TOLERANCE_MINUTES, KindTimings, Validator};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Tunables for the whole pipeline, loadable from a JSON file.
///
/// ```json
/// {
///   "validator": { "toleranceMinutes": 3, "kindSeconds": { "video": 90 } },
///   "interpreter": { "maxConsecutiveSelfLoops": 2 },
///   "kindAliases": { "open-question": "text-input" }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    pub validator: ValidatorConfig,
    pub interpreter: InterpreterConfig,
    /// Extra kind spellings, alias to canonical kind name.
    pub kind_aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub tolerance_minutes: f64,
    pub kind_seconds: KindTimings,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            kind_seconds: KindTimings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpreterConfig {
    pub max_consecutive_self_loops: u32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_consecutive_self_loops: DEFAULT_MAX_SELF_LOOPS,
        }
    }
}

impl FlowConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn normalizer(&self) -> Normalizer {
        self.kind_aliases
            .iter()
            .fold(Normalizer::builder(), |builder, (alias, canonical)| {
                builder.with_kind_alias(alias, canonical)
            })
            .build()
    }

    pub fn validator(&self) -> Validator {
        Validator::builder()
            .with_timings(self.validator.kind_seconds)
            .with_tolerance_minutes(self.validator.tolerance_minutes)
            .build()
    }

    pub fn interpreter(&self) -> Interpreter {
        Interpreter::builder()
            .max_consecutive_self_loops(self.interpreter.max_consecutive_self_loops)
            .validator(self.validator())
            .build()
    }
}
