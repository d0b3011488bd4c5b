use serde::Serialize;
use std::fmt;

/// One validation finding, tied to a block when it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(code: &'static str, block_id: Option<&str>, message: String) -> Self {
        Self {
            code,
            block_id: block_id.map(str::to_string),
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.block_id {
            Some(id) => write!(f, "[{}] block '{}': {}", self.code, id, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_blocks: usize,
    pub reachable_blocks: usize,
    pub estimated_minutes: u32,
}

/// The result of validating a graph.
///
/// Errors make a graph undeployable; warnings are advisory and never block a
/// session from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub stats: ValidationStats,
}

/// The wire shape of a report: `{valid, errors, warnings, stats}`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportJson {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn to_json(&self) -> ReportJson {
        ReportJson {
            valid: self.is_valid(),
            errors: self.error_messages(),
            warnings: self.warning_messages(),
            stats: self.stats,
        }
    }
}
