//! The condition evaluator.
//!
//! Evaluation is total: a missing variable or a value of the wrong type makes
//! a condition false, it never produces an error. Conditional transitions are
//! resolved greedily: the first rule whose condition holds wins, and the
//! mandatory `else` target is used when none does.

use crate::graph::{Condition, Predicate, Transition};
use crate::value::{Value, Variables};

mod trace;

pub use trace::{BranchTrace, TraceFormatter};

/// The outcome of resolving a block's `next` against the variable store.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub target: &'a str,
    /// Index of the rule that matched, `None` for direct and `else` transitions.
    pub matched_rule: Option<usize>,
    pub trace: BranchTrace,
}

impl Resolution<'_> {
    /// A human-readable explanation of the branch decision.
    pub fn reason(&self) -> String {
        TraceFormatter::format_trace(&self.trace)
    }
}

/// Evaluates a condition against the variable store.
///
/// * `equals(v)`: the stored value, normalized to the operand's type, equals
///   `v`. A list (multi-choice answer) matches if any element does.
/// * `in(set)`: the stored value equals some member of `set`; for a list, any
///   element being a member suffices.
/// * `gt(n)` / `lt(n)`: the stored value parses as a finite number and the
///   comparison holds.
pub fn evaluate(condition: &Condition, variables: &Variables) -> bool {
    variables
        .get(&condition.variable)
        .is_some_and(|stored| matches_predicate(stored, &condition.predicate))
}

fn matches_predicate(stored: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Equals(expected) => match stored {
            Value::List(items) if !matches!(expected, Value::List(_)) => {
                items.iter().any(|item| item.loosely_equals(expected))
            }
            _ => stored.loosely_equals(expected),
        },
        Predicate::In(set) => match stored {
            Value::List(items) => items
                .iter()
                .any(|item| set.iter().any(|member| item.loosely_equals(member))),
            _ => set.iter().any(|member| stored.loosely_equals(member)),
        },
        Predicate::Gt(n) => stored.as_number().is_some_and(|v| v > *n),
        Predicate::Lt(n) => stored.as_number().is_some_and(|v| v < *n),
    }
}

/// Resolves a transition to its target block id, first match wins.
pub fn resolve<'a>(transition: &'a Transition, variables: &Variables) -> Resolution<'a> {
    match transition {
        Transition::Direct(target) => Resolution {
            target,
            matched_rule: None,
            trace: BranchTrace::Direct {
                target: target.clone(),
            },
        },
        Transition::Conditional { rules, otherwise } => rules
            .iter()
            .enumerate()
            .find(|(_, rule)| evaluate(&rule.when, variables))
            .map(|(index, rule)| Resolution {
                target: rule.goto.as_str(),
                matched_rule: Some(index),
                trace: BranchTrace::Rule {
                    index,
                    variable: rule.when.variable.clone(),
                    observed: variables.get(&rule.when.variable).cloned(),
                    predicate: rule.when.predicate.clone(),
                    target: rule.goto.clone(),
                },
            })
            .unwrap_or_else(|| Resolution {
                target: otherwise.as_str(),
                matched_rule: None,
                trace: BranchTrace::Fallback {
                    rules_checked: rules.len(),
                    target: otherwise.clone(),
                },
            }),
    }
}
