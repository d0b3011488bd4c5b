//! Static validation of survey graphs.
//!
//! The validator never mutates the graph and is idempotent: validating the
//! same graph twice yields equal reports. Diagnostics are emitted in a stable
//! order (start block, then blocks in insertion order, then graph-wide
//! findings).

mod duration;
mod reachability;
mod report;
mod rules;

pub use duration::{KindTimings, estimate_minutes, estimate_seconds};
pub use reachability::{blocks_without_exit, reachable_from_start};
pub use report::{Diagnostic, ReportJson, ValidationReport, ValidationStats};

use crate::graph::Graph;
use rules::Findings;
use tracing::debug;

/// Default allowed gap between declared and estimated duration, in minutes.
pub const DEFAULT_TOLERANCE_MINUTES: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    timings: KindTimings,
    tolerance_minutes: f64,
}

pub struct ValidatorBuilder {
    timings: KindTimings,
    tolerance_minutes: f64,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            timings: KindTimings::default(),
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
        }
    }

    pub fn with_tolerance_minutes(mut self, minutes: f64) -> Self {
        self.tolerance_minutes = minutes;
        self
    }

    /// Overrides the timing of one kind by canonical name. Unknown names are ignored.
    pub fn with_kind_seconds(mut self, kind: &str, seconds: u32) -> Self {
        if let Some(slot) = self.timings.slot_mut(kind) {
            *slot = seconds;
        }
        self
    }

    pub fn with_timings(mut self, timings: KindTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            timings: self.timings,
            tolerance_minutes: self.tolerance_minutes,
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Validator {
    fn default() -> Self {
        ValidatorBuilder::new().build()
    }
}

impl Validator {
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub fn timings(&self) -> &KindTimings {
        &self.timings
    }

    pub fn validate(&self, graph: &Graph) -> ValidationReport {
        let mut findings = Findings::default();

        rules::check_start(graph, &mut findings);
        let written = rules::written_variables(graph);
        for block in graph.blocks() {
            rules::check_block(block, graph, &written, &mut findings);
        }

        let reachable = reachable_from_start(graph);
        for block in graph.blocks() {
            if !reachable.contains(block.id.as_str()) {
                findings.warn(
                    "W101",
                    Some(block.id.as_str()),
                    "block is unreachable from the start block".to_string(),
                );
            }
        }

        if graph.blocks().iter().any(|b| b.is_final()) {
            for id in blocks_without_exit(graph, &reachable) {
                findings.warn(
                    "W103",
                    Some(id),
                    "no final block can be reached from this block".to_string(),
                );
            }
        } else {
            findings.warn("W102", None, "graph has no final block".to_string());
        }

        let estimated_minutes = estimate_minutes(graph, &self.timings);
        if let Some(expected) = graph.expected_minutes() {
            let gap = (f64::from(estimated_minutes) - expected).abs();
            if gap > self.tolerance_minutes {
                findings.warn(
                    "W104",
                    None,
                    format!(
                        "estimated duration of {} min differs from the declared {} min",
                        estimated_minutes, expected
                    ),
                );
            }
        }

        let report = ValidationReport {
            errors: findings.errors,
            warnings: findings.warnings,
            stats: ValidationStats {
                total_blocks: graph.len(),
                reachable_blocks: reachable.len(),
                estimated_minutes,
            },
        };
        debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            reachable = report.stats.reachable_blocks,
            total = report.stats.total_blocks,
            "validated survey graph"
        );
        report
    }
}

/// Validates with the default timings and tolerance.
pub fn validate(graph: &Graph) -> ValidationReport {
    Validator::default().validate(graph)
}
