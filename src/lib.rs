//! # survey-flow - Survey Graph Validation and Interpretation
//!
//! **survey-flow** models a conversational survey as a directed graph of
//! typed blocks (messages, questions, media prompts, forms, final screens)
//! connected by direct or conditional transitions. Graphs are checked
//! statically before any respondent sees them and then walked one answer at a
//! time by a runtime interpreter.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Graph**: Parse graph JSON with [`graph::Graph::from_json`], or implement
//!     [`graph::IntoGraph`] for your own survey representation. Malformed input is
//!     rejected up front with every broken block listed.
//! 2.  **Validate**: [`validator::Validator`] reports errors (undeployable) and
//!     warnings (advisory), plus reachability and duration statistics.
//! 3.  **Run Sessions**: [`interpreter::Interpreter`] starts a session on a valid
//!     graph and advances it answer by answer, branching on stored variables.
//! 4.  **Serve**: [`runtime::SurveyRuntime`] keeps a graph registry and a session
//!     store, and serializes concurrent submissions per session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use survey_flow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let graph = Graph::from_json(
//!         r#"{
//!             "start": "q1",
//!             "blocks": [
//!                 {"id": "q1", "kind": "single-choice", "variable": "likes_art",
//!                  "options": [{"id": "yes", "label": "Yes", "value": "yes"},
//!                              {"id": "no", "label": "No", "value": "no"}],
//!                  "next": {"if": [{"when": {"variable": "likes_art", "equals": "yes"},
//!                                   "goto": "art"}],
//!                           "else": "end"}},
//!                 {"id": "art", "kind": "text-input", "variable": "favourite", "next": "end"},
//!                 {"id": "end", "kind": "final", "content": "Thanks!"}
//!             ]
//!         }"#,
//!     )?;
//!
//!     let report = Validator::default().validate(&graph);
//!     println!("{}", serde_json::to_string_pretty(&report.to_json())?);
//!
//!     let interpreter = Interpreter::default();
//!     let session = interpreter.start_session(Arc::new(graph))?;
//!     let session = interpreter.submit_answer(&session, &Value::from("yes"))?;
//!     assert_eq!(session.current_block_id(), "art");
//!     println!("progress: {:.0}%", interpreter.progress(&session) * 100.0);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod interpreter;
pub mod prelude;
pub mod runtime;
pub mod validator;
pub mod value;
