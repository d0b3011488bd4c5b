use super::report::Diagnostic;
use crate::graph::{Block, BlockKind, FormField, Graph, Predicate};
use ahash::AHashSet;
use itertools::Itertools;

/// Accumulates diagnostics while the validator folds over the graph.
#[derive(Debug, Default)]
pub(super) struct Findings {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Findings {
    pub fn error(&mut self, code: &'static str, block_id: Option<&str>, message: String) {
        self.errors.push(Diagnostic::new(code, block_id, message));
    }

    pub fn warn(&mut self, code: &'static str, block_id: Option<&str>, message: String) {
        self.warnings.push(Diagnostic::new(code, block_id, message));
    }
}

pub(super) fn check_start(graph: &Graph, findings: &mut Findings) {
    let start = graph.start_block_id();
    if !graph.contains(start) {
        findings.error(
            "E001",
            None,
            format!("start block '{}' does not exist", start),
        );
    }
}

/// Variables written by some question block of the graph.
pub(super) fn written_variables(graph: &Graph) -> AHashSet<&str> {
    graph
        .blocks()
        .iter()
        .filter(|b| b.kind.is_question())
        .filter_map(|b| b.variable.as_deref())
        .collect()
}

/// Per-block structural checks.
pub(super) fn check_block(
    block: &Block,
    graph: &Graph,
    written: &AHashSet<&str>,
    findings: &mut Findings,
) {
    let id = Some(block.id.as_str());

    if let BlockKind::Unrecognized { name } = &block.kind {
        findings.error("E006", id, format!("unrecognized block kind '{}'", name));
    }

    check_variable(block, findings);
    check_kind_attributes(block, findings);
    check_next(block, findings);

    for target in block.targets().into_iter().unique() {
        if !graph.contains(target) {
            findings.error(
                "E002",
                id,
                format!("transition references unknown block '{}'", target),
            );
        }
    }

    if let Some(next) = &block.next {
        for condition in next.conditions() {
            if matches!(&condition.predicate, Predicate::In(set) if set.is_empty()) {
                findings.warn(
                    "W107",
                    id,
                    format!("condition on '{}' uses an empty 'in' set and never matches", condition.variable),
                );
            }
            if !written.contains(condition.variable.as_str()) {
                findings.warn(
                    "W108",
                    id,
                    format!("condition reads '{}', which no block writes", condition.variable),
                );
            }
        }
    }
}

fn check_variable(block: &Block, findings: &mut Findings) {
    let id = Some(block.id.as_str());
    let has_variable = block.variable.as_deref().is_some_and(|v| !v.is_empty());
    if block.kind.is_question() && !has_variable {
        findings.error(
            "E003",
            id,
            format!("{} block must declare a variable", block.kind),
        );
    }
    if matches!(block.kind, BlockKind::Message | BlockKind::Final) && block.variable.is_some() {
        findings.warn(
            "W105",
            id,
            format!("variable on a {} block is ignored", block.kind),
        );
    }
}

fn check_kind_attributes(block: &Block, findings: &mut Findings) {
    let id = Some(block.id.as_str());
    if let Some(options) = block.kind.options() {
        if options.is_empty() {
            findings.error(
                "E004",
                id,
                format!("{} block must have at least one option", block.kind),
            );
        }
        for duplicate in options.iter().map(|o| o.id.as_str()).duplicates() {
            findings.error("E007", id, format!("duplicate option id '{}'", duplicate));
        }
    }

    match &block.kind {
        BlockKind::NumberInput {
            min: Some(min),
            max: Some(max),
        } if min > max => {
            findings.error(
                "E008",
                id,
                format!("min ({}) is greater than max ({})", min, max),
            );
        }
        BlockKind::MultiChoice {
            options,
            max_selections: Some(limit),
        } if *limit == 0 || *limit > options.len() => {
            findings.error(
                "E009",
                id,
                format!(
                    "maxSelections {} must be between 1 and the option count ({})",
                    limit,
                    options.len()
                ),
            );
        }
        BlockKind::ContactForm { fields } | BlockKind::Demographics { fields } => {
            check_fields(block, fields, findings);
        }
        _ => {}
    }
}

fn check_fields(block: &Block, fields: &[FormField], findings: &mut Findings) {
    for duplicate in fields.iter().map(|f| f.id.as_str()).duplicates() {
        findings.error(
            "E007",
            Some(block.id.as_str()),
            format!("duplicate field id '{}'", duplicate),
        );
    }
}

fn check_next(block: &Block, findings: &mut Findings) {
    let id = Some(block.id.as_str());
    match (&block.kind, &block.next) {
        (BlockKind::Final, Some(_)) => {
            findings.warn("W106", id, "next on a final block is ignored".to_string());
        }
        (BlockKind::Final | BlockKind::Unrecognized { .. }, _) => {}
        (_, None) => {
            findings.error(
                "E005",
                id,
                format!("{} block has no next", block.kind),
            );
        }
        _ => {}
    }
}
