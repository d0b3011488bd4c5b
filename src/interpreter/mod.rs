//! The runtime interpreter: walks a validated graph one answer at a time.
//!
//! Every operation takes a `&Session` and returns a new one, so a rejected
//! answer can never leave a session half-updated.

mod answer;
mod session;

pub use answer::accept_answer;
pub use session::{Session, SessionSnapshot};

use crate::error::SessionError;
use crate::evaluator;
use crate::graph::{Block, Graph};
use crate::validator::{ValidationReport, Validator};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default bound on consecutive self-transitions of one block.
pub const DEFAULT_MAX_SELF_LOOPS: u32 = 1;

#[derive(Debug, Clone)]
pub struct Interpreter {
    validator: Validator,
    max_self_loops: u32,
}

pub struct InterpreterBuilder {
    validator: Validator,
    max_self_loops: u32,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            validator: Validator::default(),
            max_self_loops: DEFAULT_MAX_SELF_LOOPS,
        }
    }

    pub fn max_consecutive_self_loops(mut self, loops: u32) -> Self {
        self.max_self_loops = loops;
        self
    }

    /// The validator run by `start_session`.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn build(self) -> Interpreter {
        Interpreter {
            validator: self.validator,
            max_self_loops: self.max_self_loops,
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        InterpreterBuilder::new().build()
    }
}

impl Interpreter {
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validates the graph and opens a session at its start block.
    pub fn start_session(&self, graph: Arc<Graph>) -> Result<Session, SessionError> {
        let report = self.validator.validate(&graph);
        self.start_validated(graph, &report)
    }

    /// Opens a session on a graph that was already validated into `report`.
    pub fn start_validated(
        &self,
        graph: Arc<Graph>,
        report: &ValidationReport,
    ) -> Result<Session, SessionError> {
        if !report.is_valid() {
            return Err(SessionError::InvalidGraph {
                errors: report.error_messages(),
            });
        }

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            current_block_id: graph.start_block_id().to_string(),
            graph,
            variables: Default::default(),
            history: Vec::new(),
            self_loops: 0,
            reachable_blocks: report.stats.reachable_blocks,
        };
        info!(
            session_id = %session.session_id,
            start = %session.current_block_id,
            "survey session started"
        );
        Ok(session)
    }

    pub fn current_block<'s>(&self, session: &'s Session) -> Result<&'s Block, SessionError> {
        session
            .graph
            .block(&session.current_block_id)
            .ok_or_else(|| SessionError::DanglingReference {
                block_id: session.current_block_id.clone(),
            })
    }

    /// Records an answer for the current block and advances to the next one.
    pub fn submit_answer(&self, session: &Session, answer: &Value) -> Result<Session, SessionError> {
        let block = self.current_block(session)?;
        if block.is_final() {
            return Err(SessionError::SessionCompleted {
                session_id: session.session_id.clone(),
            });
        }

        let stored = accept_answer(block, answer).map_err(|reason| {
            warn!(
                session_id = %session.session_id,
                block_id = %block.id,
                %reason,
                "answer rejected"
            );
            SessionError::InvalidAnswer {
                block_id: block.id.clone(),
                reason,
            }
        })?;

        let mut variables = session.variables.clone();
        if let (Some(name), Some(value)) = (&block.variable, stored) {
            variables.insert(name.clone(), value);
        }

        let next = block
            .next
            .as_ref()
            .ok_or_else(|| SessionError::DanglingReference {
                block_id: block.id.clone(),
            })?;
        let resolution = evaluator::resolve(next, &variables);
        debug!(
            session_id = %session.session_id,
            block_id = %block.id,
            reason = %resolution.reason(),
            "transition resolved"
        );

        let target = resolution.target;
        if !session.graph.contains(target) {
            return Err(SessionError::DanglingReference {
                block_id: target.to_string(),
            });
        }

        let self_loops = if target == block.id {
            session.self_loops + 1
        } else {
            0
        };
        if self_loops > self.max_self_loops {
            return Err(SessionError::NonTerminatingFlow {
                block_id: block.id.clone(),
                loops: self_loops,
            });
        }

        let mut history = session.history.clone();
        history.push(block.id.clone());

        let advanced = Session {
            session_id: session.session_id.clone(),
            graph: Arc::clone(&session.graph),
            current_block_id: target.to_string(),
            variables,
            history,
            self_loops,
            reachable_blocks: session.reachable_blocks,
        };
        if self.is_complete(&advanced) {
            info!(
                session_id = %advanced.session_id,
                answered = advanced.history.len(),
                "survey session completed"
            );
        }
        Ok(advanced)
    }

    /// Returns to the previously answered block. Stored variables are kept;
    /// answering again overwrites them.
    pub fn go_back(&self, session: &Session) -> Result<Session, SessionError> {
        if self.is_complete(session) {
            return Err(SessionError::SessionCompleted {
                session_id: session.session_id.clone(),
            });
        }
        let mut history = session.history.clone();
        let previous = history.pop().ok_or_else(|| SessionError::NothingToUndo {
            session_id: session.session_id.clone(),
        })?;

        Ok(Session {
            session_id: session.session_id.clone(),
            graph: Arc::clone(&session.graph),
            current_block_id: previous,
            variables: session.variables.clone(),
            history,
            self_loops: 0,
            reachable_blocks: session.reachable_blocks,
        })
    }

    pub fn is_complete(&self, session: &Session) -> bool {
        session
            .graph
            .block(&session.current_block_id)
            .is_some_and(Block::is_final)
    }

    /// Fraction of the survey completed, in `[0, 1]`.
    pub fn progress(&self, session: &Session) -> f64 {
        if self.is_complete(session) {
            return 1.0;
        }
        let answered = session.history.len();
        answered as f64 / (answered + 1).max(session.reachable_blocks) as f64
    }
}
