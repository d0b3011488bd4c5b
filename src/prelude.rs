//! Prelude module for convenient imports
//!
//! Re-exports the types most applications need to load, validate and run
//! survey graphs.
//!
//! # Example
//!
//! ```rust,no_run
//! use survey_flow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let runtime = SurveyRuntime::new();
//! let report = runtime.register_graph("onboarding", Graph::from_file("path/to/graph.json")?);
//! if !report.is_valid() {
//!     for error in report.error_messages() {
//!         eprintln!("{}", error);
//!     }
//!     return Ok(());
//! }
//!
//! let start = runtime.start_session("onboarding")?;
//! let outcome = runtime.submit_answer(&start.session_id, &start.first_block.id, "yes")?;
//! println!("progress: {}", outcome.progress);
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{
    Block, BlockKind, ChoiceOption, Condition, FormField, Graph, IntoGraph, Normalizer, Predicate,
    Rule, Transition,
};

// Validation, interpretation and the service facade
pub use crate::interpreter::{Interpreter, Session};
pub use crate::runtime::{AnswerOutcome, SessionStart, SurveyRuntime};
pub use crate::validator::{ValidationReport, Validator};

// Values and evaluation
pub use crate::evaluator::{TraceFormatter, evaluate, resolve};
pub use crate::value::{Value, Variables};

// Configuration
pub use crate::config::FlowConfig;

// Error types
pub use crate::error::{GraphError, RuntimeError, SessionError};

// Standard library re-exports commonly used with this crate
pub use std::path::Path;
pub use std::sync::Arc;

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
