use crate::graph::Graph;
use crate::value::{Value, Variables};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The state of one respondent's walk through a graph.
///
/// Sessions are values: the interpreter never mutates one in place, it
/// returns the next session instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub(crate) session_id: String,
    pub(crate) graph: Arc<Graph>,
    pub(crate) current_block_id: String,
    pub(crate) variables: Variables,
    pub(crate) history: Vec<String>,
    pub(crate) self_loops: u32,
    pub(crate) reachable_blocks: usize,
}

impl Session {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn current_block_id(&self) -> &str {
        &self.current_block_id
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Block ids answered so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Consecutive self-transitions taken by the current block.
    pub fn self_loops(&self) -> u32 {
        self.self_loops
    }

    /// Number of blocks reachable from the start block, used for progress.
    pub fn reachable_blocks(&self) -> usize {
        self.reachable_blocks
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            current_block_id: self.current_block_id.clone(),
            variables: self.variables.clone(),
            history: self.history.clone(),
            self_loops: self.self_loops,
            reachable_blocks: self.reachable_blocks,
        }
    }

    /// Rebuilds a session from a stored snapshot and the graph it runs on.
    pub fn restore(snapshot: SessionSnapshot, graph: Arc<Graph>) -> Self {
        Self {
            session_id: snapshot.session_id,
            graph,
            current_block_id: snapshot.current_block_id,
            variables: snapshot.variables,
            history: snapshot.history,
            self_loops: snapshot.self_loops,
            reachable_blocks: snapshot.reachable_blocks,
        }
    }
}

/// A session without its graph, as kept by a `SessionStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub current_block_id: String,
    pub variables: Variables,
    pub history: Vec<String>,
    pub self_loops: u32,
    pub reachable_blocks: usize,
}
