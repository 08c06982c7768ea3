use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    /// A node executor raised; the run stopped at this node.
    #[error("Node {node_id} failed: {source}")]
    NodeFailed {
        node_id: String,
        #[source]
        source: NodeError,
    },

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    /// The node error behind a failed run, if the failure came from an executor.
    pub fn node_error(&self) -> Option<&NodeError> {
        match self {
            FlowError::NodeFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised by node executors.
///
/// The `Display` text is what hosts show to users, so it is forwarded
/// verbatim to `on_node_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("No input to {0}")]
    NoInput(&'static str),

    #[error("No text is currently selected on the page")]
    NoSelection,

    #[error("{0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Failed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(String),

    #[error("Edge {edge_id} references unknown node {node_id}")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("Cyclic dependency between nodes: {}", nodes.join(", "))]
    CyclicDependency { nodes: Vec<String> },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Invalid config for node {node_id}: {reason}")]
    InvalidConfig { node_id: String, reason: String },
}
