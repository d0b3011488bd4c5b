use itertools::Itertools;
use std::fmt;
use thiserror::Error;

/// A single structural problem found while normalizing a raw graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIssue {
    /// The offending block id, or `None` when the block has no usable id
    /// (or the issue concerns the graph as a whole).
    pub block_id: Option<String>,
    /// Position of the block in the raw `blocks` array, if applicable.
    pub index: Option<usize>,
    pub message: String,
}

impl fmt::Display for BlockIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.block_id, self.index) {
            (Some(id), _) => write!(f, "block '{}': {}", id, self.message),
            (None, Some(index)) => write!(f, "block #{}: {}", index, self.message),
            (None, None) => write!(f, "graph: {}", self.message),
        }
    }
}

/// Errors raised at the graph boundary, before validation ever runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Failed to parse survey graph JSON: {0}")]
    JsonParseError(String),

    #[error("Malformed survey graph ({} issue(s)): {}", .issues.len(), .issues.iter().join("; "))]
    MalformedGraph { issues: Vec<BlockIssue> },
}

impl GraphError {
    /// The structural issues behind a `MalformedGraph` error (empty otherwise).
    pub fn issues(&self) -> &[BlockIssue] {
        match self {
            GraphError::MalformedGraph { issues } => issues,
            GraphError::JsonParseError(_) => &[],
        }
    }
}

/// Errors raised by the interpreter while starting or advancing a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Survey graph failed validation with {} error(s): {}", .errors.len(), .errors.join("; "))]
    InvalidGraph { errors: Vec<String> },

    #[error("Invalid answer for block '{block_id}': {reason}")]
    InvalidAnswer { block_id: String, reason: String },

    #[error("Block '{block_id}' is referenced by the session but does not exist in the graph")]
    DanglingReference { block_id: String },

    #[error("Block '{block_id}' transitioned to itself {loops} times in a row")]
    NonTerminatingFlow { block_id: String, loops: u32 },

    #[error("Session '{session_id}' has already reached a final block")]
    SessionCompleted { session_id: String },

    #[error("Session '{session_id}' has no previous block to return to")]
    NothingToUndo { session_id: String },
}

impl SessionError {
    /// Recoverable errors leave the session untouched; the caller re-renders
    /// the same block. Everything else ends the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidAnswer { .. } | SessionError::NothingToUndo { .. }
        )
    }

    /// Faults that a validated graph should make unreachable.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            SessionError::DanglingReference { .. } | SessionError::NonTerminatingFlow { .. }
        )
    }
}

/// Errors raised by a `SessionStore` backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session snapshot codec failure: {0}")]
    Codec(String),

    #[error("Session store failure: {0}")]
    Backend(String),
}

/// Errors surfaced by the `SurveyRuntime` facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("No survey graph registered under id '{0}'")]
    GraphNotFound(String),

    #[error("No live session with id '{0}'")]
    SessionNotFound(String),

    #[error("Answer targets block '{submitted}', but the session is at block '{current}'")]
    StaleBlock { submitted: String, current: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RuntimeError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            RuntimeError::StaleBlock { .. } => true,
            RuntimeError::Session(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors raised while loading a `FlowConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {message}")]
    Parse { path: String, message: String },
}
