//! The survey flow graph model.
//!
//! A [`Graph`] is an ordered arena of [`Block`]s plus an id index. It is built
//! once at the boundary by the [`Normalizer`] (or anything implementing
//! [`IntoGraph`]) and is read-only afterwards; the runtime shares it between
//! sessions behind an `Arc`.

pub mod block;
pub mod conversion;
pub mod normalize;
pub mod transition;

pub use block::*;
pub use conversion::*;
pub use normalize::*;
pub use transition::*;

use crate::error::{BlockIssue, GraphError};
use ahash::AHashMap;
use serde::Serialize;
use std::path::Path;

/// A survey as a whole: the start block plus every block in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    start_block_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_minutes: Option<f64>,
    blocks: Vec<Block>,
    #[serde(skip)]
    index: AHashMap<String, usize>,
}

impl Graph {
    /// Assembles a graph from already-typed blocks.
    ///
    /// Only the boundary invariants are enforced here (non-empty, unique ids);
    /// referential integrity is the validator's job.
    pub fn new(start_block_id: impl Into<String>, blocks: Vec<Block>) -> Result<Self, GraphError> {
        let mut issues = Vec::new();
        let mut index = AHashMap::with_capacity(blocks.len());
        for (position, block) in blocks.iter().enumerate() {
            if index.contains_key(&block.id) {
                issues.push(BlockIssue {
                    block_id: Some(block.id.clone()),
                    index: Some(position),
                    message: "duplicate block id".to_string(),
                });
            } else {
                index.insert(block.id.clone(), position);
            }
        }
        if blocks.is_empty() {
            issues.push(BlockIssue {
                block_id: None,
                index: None,
                message: "graph has no blocks".to_string(),
            });
        }
        if !issues.is_empty() {
            return Err(GraphError::MalformedGraph { issues });
        }

        Ok(Self {
            start_block_id: start_block_id.into(),
            title: None,
            expected_minutes: None,
            blocks,
            index,
        })
    }

    /// Parses and normalizes a graph from a JSON string with the default normalizer.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        json.into_graph()
    }

    /// Loads a graph from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphError::JsonParseError(format!("Could not read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_expected_minutes(mut self, minutes: f64) -> Self {
        self.expected_minutes = Some(minutes);
        self
    }

    pub fn start_block_id(&self) -> &str {
        &self.start_block_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The duration the author declared, if any.
    pub fn expected_minutes(&self) -> Option<f64> {
        self.expected_minutes
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.index.get(id).map(|&position| &self.blocks[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Blocks in insertion order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
