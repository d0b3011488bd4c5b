use crate::graph::Predicate;
use crate::value::Value;

/// A record of how a transition was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchTrace {
    /// An unconditional `next`.
    Direct { target: String },
    /// A rule matched; earlier rules (if any) did not.
    Rule {
        index: usize,
        variable: String,
        observed: Option<Value>,
        predicate: Predicate,
        target: String,
    },
    /// No rule matched and the `else` target was taken.
    Fallback { rules_checked: usize, target: String },
}

impl BranchTrace {
    pub fn target(&self) -> &str {
        match self {
            BranchTrace::Direct { target }
            | BranchTrace::Rule { target, .. }
            | BranchTrace::Fallback { target, .. } => target,
        }
    }
}

/// Formats branch traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format a branch trace into a one-line explanation.
    pub fn format_trace(trace: &BranchTrace) -> String {
        match trace {
            BranchTrace::Direct { target } => format!("-> {}", target),
            BranchTrace::Rule {
                index,
                variable,
                observed,
                predicate,
                target,
            } => format!(
                "rule #{}: {} (was {}) {} -> {}",
                index,
                variable,
                Self::format_observed(observed.as_ref()),
                predicate,
                target
            ),
            BranchTrace::Fallback {
                rules_checked,
                target,
            } => format!(
                "no rule matched ({} checked) -> else {}",
                rules_checked, target
            ),
        }
    }

    fn format_observed(value: Option<&Value>) -> String {
        match value {
            Some(value) => value.to_string(),
            None => "unset".to_string(),
        }
    }
}
