use sheetcore::{NodeCategory, NodeExecutor, NodeInstance, Workflow, WorkflowError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Metadata about a node type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub node_type: String,
    pub label: String,
    pub description: Option<String>,
    pub category: NodeCategory,
    /// Merged into a new instance's data bag by [`NodeRegistry::instantiate`].
    pub default_config: Map<String, Value>,
}

impl NodeMetadata {
    pub fn new(node_type: impl Into<String>, label: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            node_type: node_type.into(),
            label: label.into(),
            description: None,
            category,
            default_config: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_config.insert(key.into(), value.into());
        self
    }
}

/// A registered node type. Entries without an executor pass their input through.
#[derive(Clone)]
pub struct RegistryEntry {
    pub metadata: NodeMetadata,
    pub executor: Option<Arc<dyn NodeExecutor>>,
}

/// Registry of available node types.
///
/// Built once at startup and only read afterwards.
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
    order: Vec<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a node type. Registering the same type again replaces it.
    pub fn register(&mut self, metadata: NodeMetadata, executor: Option<Arc<dyn NodeExecutor>>) {
        let node_type = metadata.node_type.clone();
        tracing::info!("Registering node type: {}", node_type);
        if !self.entries.contains_key(&node_type) {
            self.order.push(node_type.clone());
        }
        self.entries.insert(node_type, RegistryEntry { metadata, executor });
    }

    pub fn lookup(&self, node_type: &str) -> Option<&RegistryEntry> {
        self.entries.get(node_type)
    }

    /// Get all registered node types, in registration order
    pub fn list_node_types(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn get_metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type).map(|e| &e.metadata)
    }

    /// Create a node instance of a registered type with its default config applied.
    pub fn instantiate(&self, id: impl Into<String>, node_type: &str) -> Result<NodeInstance, WorkflowError> {
        let entry = self
            .lookup(node_type)
            .ok_or_else(|| WorkflowError::UnknownNodeType(node_type.to_string()))?;
        let mut node = NodeInstance::new(id, node_type);
        node.data = entry.metadata.default_config.clone();
        Ok(node)
    }

    /// Add a node of a registered type to a workflow under the next sequential id.
    pub fn add_to(&self, workflow: &mut Workflow, node_type: &str) -> Result<String, WorkflowError> {
        let entry = self
            .lookup(node_type)
            .ok_or_else(|| WorkflowError::UnknownNodeType(node_type.to_string()))?;
        Ok(workflow.add_node(node_type, entry.metadata.default_config.clone()))
    }

    /// Load-time check: the workflow is structurally sound and every node of a
    /// known type has a configuration its executor accepts.
    ///
    /// Unknown types are not an error here; they are skipped when the workflow runs.
    pub fn validate_workflow(&self, workflow: &Workflow) -> Result<(), WorkflowError> {
        workflow.validate()?;
        for node in &workflow.nodes {
            match self.lookup(&node.node_type) {
                Some(RegistryEntry { executor: Some(executor), .. }) => {
                    executor
                        .validate_config(node.snapshot().config())
                        .map_err(|e| WorkflowError::InvalidConfig {
                            node_id: node.id.clone(),
                            reason: e.to_string(),
                        })?;
                }
                Some(_) => {}
                None => {
                    tracing::warn!(node_id = %node.id, "Unknown node type: {}", node.node_type);
                }
            }
        }
        Ok(())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sheetcore::{NodeContext, NodeError};

    struct Upper;

    #[async_trait]
    impl NodeExecutor for Upper {
        async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
            Ok(ctx.input.to_uppercase())
        }

        fn validate_config(&self, config: &Map<String, Value>) -> Result<(), NodeError> {
            match config.get("mode") {
                Some(Value::String(_)) | None => Ok(()),
                Some(_) => Err(NodeError::Configuration("mode must be a string".into())),
            }
        }
    }

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeMetadata::new("upper", "Upper", NodeCategory::Processing).with_default("mode", "all"),
            Some(Arc::new(Upper)),
        );
        registry.register(NodeMetadata::new("show", "Show", NodeCategory::Output), None);
        registry
    }

    #[test]
    fn lookup_and_listing() {
        let registry = registry();
        assert!(registry.lookup("upper").unwrap().executor.is_some());
        assert!(registry.lookup("show").unwrap().executor.is_none());
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.list_node_types(), vec!["upper", "show"]);
        assert_eq!(registry.get_metadata("show").unwrap().category, NodeCategory::Output);
    }

    #[test]
    fn re_registering_keeps_position() {
        let mut registry = registry();
        registry.register(NodeMetadata::new("upper", "Shout", NodeCategory::Processing), None);
        assert_eq!(registry.list_node_types(), vec!["upper", "show"]);
        assert_eq!(registry.get_metadata("upper").unwrap().label, "Shout");
    }

    #[test]
    fn instantiate_applies_defaults() {
        let registry = registry();
        let node = registry.instantiate("n1", "upper").unwrap();
        assert_eq!(node.data.get("mode"), Some(&Value::from("all")));
        assert_eq!(
            registry.instantiate("n2", "missing").unwrap_err(),
            WorkflowError::UnknownNodeType("missing".into())
        );

        let mut workflow = Workflow::new("wf");
        let id = registry.add_to(&mut workflow, "upper").unwrap();
        assert_eq!(id, "n1");
        assert_eq!(workflow.nodes[0].data.get("mode"), Some(&Value::from("all")));
    }

    #[test]
    fn validate_workflow_checks_configs() {
        let registry = registry();
        let mut workflow = Workflow::new("wf");
        workflow.insert_node(NodeInstance::new("n1", "upper").with_config("mode", 3));
        workflow.insert_node(NodeInstance::new("n2", "unregistered"));

        match registry.validate_workflow(&workflow) {
            Err(WorkflowError::InvalidConfig { node_id, .. }) => assert_eq!(node_id, "n1"),
            other => panic!("expected invalid config, got {:?}", other),
        }

        workflow.find_node_mut("n1").unwrap().data.insert("mode".into(), "all".into());
        assert!(registry.validate_workflow(&workflow).is_ok());
    }
}
