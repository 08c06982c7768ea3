//! Core abstractions for the workflow engine
//!
//! This crate provides the workflow data model, the node executor contract
//! and the error and event types that the runtime and node crates share.

mod error;
pub mod events;
mod node;
mod workflow;

pub use error::{FlowError, NodeError, WorkflowError};
pub use events::{EventBus, ExecutionEvent, ExecutionId};
pub use node::{
    parse_config, ExecutionMode, NodeCategory, NodeContext, NodeExecutor, NodeSnapshot,
    NodeStatus, PageContext, SelectionRect, TabId,
};
pub use workflow::{Edge, EdgeId, NodeId, NodeInstance, Position, Workflow, WorkflowId, TRANSIENT_KEYS};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
