use super::{Graph, Normalizer, RawGraph};
use crate::error::GraphError;

/// Anything that can be turned into a survey [`Graph`].
///
/// This is the seam for external generators and editors: implement it on
/// your own survey representation to hand graphs to the validator and the
/// interpreter without going through JSON.
///
/// # Example
///
/// ```rust,no_run
/// use survey_flow::prelude::*;
///
/// struct Questionnaire {
///     questions: Vec<(String, String)>, // (variable, prompt)
/// }
///
/// impl IntoGraph for Questionnaire {
///     fn into_graph(self) -> Result<Graph, GraphError> {
///         let count = self.questions.len();
///         let mut blocks: Vec<Block> = self
///             .questions
///             .into_iter()
///             .enumerate()
///             .map(|(i, (variable, prompt))| Block {
///                 id: format!("q{}", i),
///                 kind: BlockKind::TextInput { max_length: None },
///                 prompt: Some(prompt),
///                 variable: Some(variable),
///                 next: Some(Transition::Direct(if i + 1 == count {
///                     "done".to_string()
///                 } else {
///                     format!("q{}", i + 1)
///                 })),
///             })
///             .collect();
///         blocks.push(Block {
///             id: "done".to_string(),
///             kind: BlockKind::Final,
///             prompt: Some("Thanks!".to_string()),
///             variable: None,
///             next: None,
///         });
///         Graph::new("q0", blocks)
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the value and converts it into a survey graph.
    fn into_graph(self) -> Result<Graph, GraphError>;
}

impl IntoGraph for Graph {
    fn into_graph(self) -> Result<Graph, GraphError> {
        Ok(self)
    }
}

impl IntoGraph for RawGraph {
    fn into_graph(self) -> Result<Graph, GraphError> {
        Normalizer::default().normalize(self)
    }
}

impl IntoGraph for serde_json::Value {
    fn into_graph(self) -> Result<Graph, GraphError> {
        Normalizer::default().normalize_json(self)
    }
}

impl IntoGraph for &str {
    fn into_graph(self) -> Result<Graph, GraphError> {
        let json: serde_json::Value = serde_json::from_str(self)
            .map_err(|e| GraphError::JsonParseError(e.to_string()))?;
        json.into_graph()
    }
}
