//! The service facade: a graph registry, a session table and a store.
//!
//! Each session has its own mutex held across load, interpret and save, so
//! concurrent submissions for one session are serialized while different
//! sessions proceed in parallel. Graphs are shared behind `Arc` and replaced
//! copy-on-write; a live session keeps the revision it started on.

mod store;

pub use store::{MemorySessionStore, SessionStore};

use crate::error::{RuntimeError, SessionError};
use crate::graph::{Block, Graph};
use crate::interpreter::{Interpreter, Session};
use crate::validator::ValidationReport;
use crate::value::Value;
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Returned by `start_session`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    pub session_id: String,
    pub first_block: Block,
}

/// Returned by `submit_answer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    /// `None` once a final block has been reached.
    pub next_block: Option<Block>,
    pub progress: f64,
    pub completed: bool,
}

struct RegisteredGraph {
    graph: Arc<Graph>,
    report: ValidationReport,
}

struct SessionSlot {
    graph: Arc<Graph>,
    lock: Mutex<()>,
}

pub struct SurveyRuntime<S: SessionStore = MemorySessionStore> {
    interpreter: Interpreter,
    graphs: RwLock<AHashMap<String, Arc<RegisteredGraph>>>,
    sessions: RwLock<AHashMap<String, Arc<SessionSlot>>>,
    store: S,
}

impl SurveyRuntime<MemorySessionStore> {
    pub fn new() -> Self {
        Self::with_store(Interpreter::default(), MemorySessionStore::new())
    }
}

impl Default for SurveyRuntime<MemorySessionStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SessionStore> SurveyRuntime<S> {
    pub fn with_store(interpreter: Interpreter, store: S) -> Self {
        Self {
            interpreter,
            graphs: RwLock::new(AHashMap::new()),
            sessions: RwLock::new(AHashMap::new()),
            store,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and registers a graph, replacing any previous revision.
    ///
    /// The graph is registered even when invalid; starting a session on it
    /// fails with the report's errors.
    pub fn register_graph(&self, graph_id: &str, graph: Graph) -> ValidationReport {
        let report = self.interpreter.validator().validate(&graph);
        info!(
            graph_id,
            valid = report.is_valid(),
            warnings = report.warnings.len(),
            "survey graph registered"
        );
        let entry = Arc::new(RegisteredGraph {
            graph: Arc::new(graph),
            report: report.clone(),
        });
        self.graphs.write().insert(graph_id.to_string(), entry);
        report
    }

    pub fn graph(&self, graph_id: &str) -> Option<Arc<Graph>> {
        self.graphs
            .read()
            .get(graph_id)
            .map(|entry| Arc::clone(&entry.graph))
    }

    pub fn start_session(&self, graph_id: &str) -> Result<SessionStart, RuntimeError> {
        let entry = self
            .graphs
            .read()
            .get(graph_id)
            .cloned()
            .ok_or_else(|| RuntimeError::GraphNotFound(graph_id.to_string()))?;

        let session = self
            .interpreter
            .start_validated(Arc::clone(&entry.graph), &entry.report)?;
        let first_block = self.interpreter.current_block(&session)?.clone();
        self.store.save(&session.snapshot())?;
        self.sessions.write().insert(
            session.session_id().to_string(),
            Arc::new(SessionSlot {
                graph: Arc::clone(&entry.graph),
                lock: Mutex::new(()),
            }),
        );

        Ok(SessionStart {
            session_id: session.session_id().to_string(),
            first_block,
        })
    }

    /// Submits an answer for `block_id`, which must be the session's current block.
    pub fn submit_answer(
        &self,
        session_id: &str,
        block_id: &str,
        answer: impl Into<Value>,
    ) -> Result<AnswerOutcome, RuntimeError> {
        let slot = self.slot(session_id)?;
        let _guard = slot.lock.lock();
        let session = self.load(session_id, &slot)?;

        if session.current_block_id() != block_id {
            warn!(
                session_id,
                submitted = block_id,
                current = session.current_block_id(),
                "stale answer submission"
            );
            return Err(RuntimeError::StaleBlock {
                submitted: block_id.to_string(),
                current: session.current_block_id().to_string(),
            });
        }

        let advanced = match self.interpreter.submit_answer(&session, &answer.into()) {
            Ok(advanced) => advanced,
            Err(e) => return Err(self.fail(session_id, e)),
        };

        let progress = self.interpreter.progress(&advanced);
        if self.interpreter.is_complete(&advanced) {
            self.discard(session_id)?;
            return Ok(AnswerOutcome {
                next_block: None,
                progress,
                completed: true,
            });
        }

        let next_block = match self.interpreter.current_block(&advanced) {
            Ok(block) => block.clone(),
            Err(e) => return Err(self.fail(session_id, e)),
        };
        self.store.save(&advanced.snapshot())?;
        Ok(AnswerOutcome {
            next_block: Some(next_block),
            progress,
            completed: false,
        })
    }

    /// Moves the session back one block and returns that block.
    pub fn go_back(&self, session_id: &str) -> Result<Block, RuntimeError> {
        let slot = self.slot(session_id)?;
        let _guard = slot.lock.lock();
        let session = self.load(session_id, &slot)?;

        let previous = self.interpreter.go_back(&session)?;
        let block = match self.interpreter.current_block(&previous) {
            Ok(block) => block.clone(),
            Err(e) => return Err(self.fail(session_id, e)),
        };
        self.store.save(&previous.snapshot())?;
        Ok(block)
    }

    pub fn terminate_session(&self, session_id: &str) -> Result<(), RuntimeError> {
        let slot = self.slot(session_id)?;
        let _guard = slot.lock.lock();
        self.discard(session_id)?;
        info!(session_id, "survey session terminated");
        Ok(())
    }

    /// A copy of the live session, for inspection.
    pub fn session(&self, session_id: &str) -> Result<Session, RuntimeError> {
        let slot = self.slot(session_id)?;
        let _guard = slot.lock.lock();
        self.load(session_id, &slot)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn slot(&self, session_id: &str) -> Result<Arc<SessionSlot>, RuntimeError> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))
    }

    fn load(&self, session_id: &str, slot: &SessionSlot) -> Result<Session, RuntimeError> {
        let snapshot = self
            .store
            .load(session_id)?
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))?;
        Ok(Session::restore(snapshot, Arc::clone(&slot.graph)))
    }

    fn discard(&self, session_id: &str) -> Result<(), RuntimeError> {
        self.sessions.write().remove(session_id);
        self.store.remove(session_id)?;
        Ok(())
    }

    /// Converts an interpreter error, ending the session on defects.
    fn fail(&self, session_id: &str, e: SessionError) -> RuntimeError {
        if e.is_defect() {
            error!(session_id, error = %e, "session aborted on a graph defect");
            if let Err(store_error) = self.discard(session_id) {
                error!(session_id, error = %store_error, "failed to discard aborted session");
            }
        }
        e.into()
    }
}
