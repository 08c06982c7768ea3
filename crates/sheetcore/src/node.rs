use crate::{NodeError, NodeId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Identifier of the browser tab/page a run targets.
pub type TabId = i64;

/// Core trait that every node type with real work implements.
///
/// Executors are shared across runs and must not keep per-run state.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Produce this node's output from its input text.
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError>;

    /// Optional: check a node's configuration when a workflow is loaded.
    fn validate_config(&self, _config: &Map<String, Value>) -> Result<(), NodeError> {
        Ok(())
    }
}

/// Everything an executor gets for one invocation.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub node: NodeSnapshot,

    /// Output of the upstream node, or empty when nothing feeds this node.
    pub input: String,

    pub tab_id: TabId,

    pub mode: ExecutionMode,

    /// Page details captured by the host before the run, if any.
    pub page: Option<PageContext>,

    pub workflow_name: Option<String>,
}

impl NodeContext {
    pub fn new(node: NodeSnapshot, input: impl Into<String>, tab_id: TabId) -> Self {
        Self {
            node,
            input: input.into(),
            tab_id,
            mode: ExecutionMode::Visual,
            page: None,
            workflow_name: None,
        }
    }

    /// Input text, or `NoInput(action)` when it is empty.
    pub fn require_input(&self, action: &'static str) -> Result<&str, NodeError> {
        if self.input.is_empty() {
            Err(NodeError::NoInput(action))
        } else {
            Ok(&self.input)
        }
    }
}

/// Immutable view of a node instance taken when it is scheduled.
///
/// Edits made to the workflow afterwards produce a new snapshot; they never
/// reach an executor that is already running.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub node_type: String,
    config: Arc<Map<String, Value>>,
}

impl NodeSnapshot {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, config: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    /// Deserialize the configuration into a node type's typed schema.
    pub fn typed_config<T: DeserializeOwned>(&self) -> Result<T, NodeError> {
        parse_config(&self.config)
    }
}

/// Parse a configuration bag into a typed schema. Unknown keys are ignored.
pub fn parse_config<T: DeserializeOwned>(config: &Map<String, Value>) -> Result<T, NodeError> {
    serde_json::from_value(Value::Object(config.clone()))
        .map_err(|e| NodeError::Configuration(e.to_string()))
}

/// Page details captured by the host (e.g. from a context-menu click).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_rect: Option<SelectionRect>,
}

impl PageContext {
    /// Pre-captured selection, if it has any non-whitespace content.
    pub fn selection(&self) -> Option<&str> {
        self.selected_text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

/// How a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Interactive run from the editor; display-only nodes take part.
    #[default]
    Visual,
    /// Programmatic run triggered outside the editor.
    Headless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Input,
    Processing,
    Output,
}

/// Display status of a node, as tracked by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Done,
}
