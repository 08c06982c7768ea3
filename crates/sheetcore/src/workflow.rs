use crate::{FlowError, NodeSnapshot, WorkflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub type WorkflowId = String;
pub type NodeId = String;
pub type EdgeId = String;

/// Data-bag keys written by hosts for display purposes. They never reach executors.
pub const TRANSIENT_KEYS: &[&str] = &["status", "output"];

/// Complete workflow definition: the unit of execution and persistence.
///
/// Node order matters: it is the tie-break order used when several nodes
/// become runnable at the same time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeInstance>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("wf_{}", now.timestamp_millis()),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Parse a stored workflow record and check its structural invariants.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let workflow: Workflow = serde_json::from_str(json)?;
        workflow.validate()?;
        Ok(workflow)
    }

    pub fn to_json(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a node of the given type, assigning the next sequential id (`n1`, `n2`, ...).
    pub fn add_node(&mut self, node_type: impl Into<String>, config: Map<String, Value>) -> NodeId {
        let id = self.next_node_id();
        self.nodes.push(NodeInstance {
            id: id.clone(),
            node_type: node_type.into(),
            data: config,
            position: None,
        });
        id
    }

    /// Append a fully formed node instance, keeping its id.
    pub fn insert_node(&mut self, node: NodeInstance) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Connect `source`'s output to `target`'s input. Connecting a pair that
    /// is already connected returns the existing edge's id.
    pub fn connect(&mut self, source: impl Into<String>, target: impl Into<String>) -> EdgeId {
        let source = source.into();
        let target = target.into();
        if let Some(existing) = self
            .edges
            .iter()
            .find(|e| e.source == source && e.target == target)
        {
            return existing.id.clone();
        }
        let id = format!("e{}-{}", source, target);
        self.edges.push(Edge {
            id: id.clone(),
            source,
            target,
        });
        id
    }

    /// Remove a node and every edge touching it. Returns the removed node.
    pub fn remove_node(&mut self, id: &str) -> Option<NodeInstance> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Some(self.nodes.remove(index))
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(index))
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut NodeInstance> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Nodes with no incoming edge, in node order.
    pub fn entry_nodes(&self) -> Vec<&NodeInstance> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .collect()
    }

    /// Whether the first entry node is of the given type.
    pub fn starts_with(&self, node_type: &str) -> bool {
        self.entry_nodes()
            .first()
            .map(|n| n.node_type == node_type)
            .unwrap_or(false)
    }

    /// Check the structural invariants: unique node and edge ids, and
    /// every edge endpoint present among the nodes.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(WorkflowError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(WorkflowError::DuplicateEdgeId(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(WorkflowError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Mark the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn next_node_id(&self) -> NodeId {
        let max = self
            .nodes
            .iter()
            .filter_map(|n| n.id.strip_prefix('n')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        match max.checked_add(1) {
            Some(next) => format!("n{}", next),
            // Suffix space exhausted; take the lowest free one instead.
            None => {
                let mut k: u64 = 1;
                while self.find_node(&format!("n{}", k)).is_some() {
                    k += 1;
                }
                format!("n{}", k)
            }
        }
    }
}

/// A node placed in a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInstance {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Configuration values, plus any display state a host chose to store.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl NodeInstance {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: Map::new(),
            position: None,
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    /// Immutable copy of the configuration handed to executors.
    pub fn snapshot(&self) -> NodeSnapshot {
        let mut config = self.data.clone();
        for key in TRANSIENT_KEYS {
            config.remove(*key);
        }
        NodeSnapshot::new(self.id.clone(), self.node_type.clone(), config)
    }
}

/// Directed "output of source feeds input of target" relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Node position in the visual editor. Irrelevant to execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain(types: &[&str]) -> Workflow {
        let mut workflow = Workflow::new("test");
        let mut prev: Option<NodeId> = None;
        for node_type in types {
            let id = workflow.add_node(*node_type, Map::new());
            if let Some(p) = prev {
                workflow.connect(p, id.clone());
            }
            prev = Some(id);
        }
        workflow
    }

    #[test]
    fn node_ids_are_sequential() {
        let workflow = chain(&["getPageText", "summarize", "textOutput"]);
        let ids: Vec<_> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
        assert_eq!(workflow.edges[0].id, "en1-n2");
    }

    #[test]
    fn next_id_follows_highest_existing_suffix() {
        let mut workflow = Workflow::new("test");
        workflow.insert_node(NodeInstance::new("n7", "summarize"));
        workflow.insert_node(NodeInstance::new("custom", "summarize"));
        assert_eq!(workflow.add_node("translate", Map::new()), "n8");
    }

    #[test]
    fn next_id_survives_suffix_overflow() {
        let mut workflow = Workflow::new("test");
        workflow.insert_node(NodeInstance::new(format!("n{}", u64::MAX), "summarize"));
        workflow.insert_node(NodeInstance::new("n1", "summarize"));
        assert_eq!(workflow.add_node("translate", Map::new()), "n2");
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn connecting_twice_reuses_the_edge() {
        let mut workflow = chain(&["getPageText", "summarize"]);
        assert_eq!(workflow.connect("n1", "n2"), "en1-n2");
        assert_eq!(workflow.edges.len(), 1);
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn removing_a_node_drops_its_edges() {
        let mut workflow = chain(&["getPageText", "summarize", "textOutput"]);
        let removed = workflow.remove_node("n2").expect("node exists");
        assert_eq!(removed.node_type, "summarize");
        assert!(workflow.edges.is_empty());
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn validate_rejects_dangling_edge() {
        let mut workflow = chain(&["getPageText"]);
        workflow.connect("n1", "ghost");
        assert_eq!(
            workflow.validate(),
            Err(WorkflowError::DanglingEdge {
                edge_id: "en1-ghost".into(),
                node_id: "ghost".into(),
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut workflow = Workflow::new("dup");
        workflow.insert_node(NodeInstance::new("a", "summarize"));
        workflow.insert_node(NodeInstance::new("a", "translate"));
        assert_eq!(
            workflow.validate(),
            Err(WorkflowError::DuplicateNodeId("a".into()))
        );

        let mut workflow = chain(&["getPageText", "summarize"]);
        workflow.edges.push(Edge {
            id: "en1-n2".into(),
            source: "n1".into(),
            target: "n2".into(),
        });
        assert_eq!(
            workflow.validate(),
            Err(WorkflowError::DuplicateEdgeId("en1-n2".into()))
        );
    }

    #[test]
    fn cycles_are_structurally_valid() {
        let mut workflow = chain(&["summarize", "translate"]);
        workflow.connect("n2", "n1");
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn entry_nodes_and_start_type() {
        let mut workflow = chain(&["getSelection", "translate"]);
        workflow.add_node("getPageText", Map::new());
        let entries: Vec<_> = workflow.entry_nodes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(entries, vec!["n1", "n3"]);
        assert!(workflow.starts_with("getSelection"));
        assert!(!workflow.starts_with("getPageText"));
    }

    #[test]
    fn snapshot_strips_display_state() {
        let node = NodeInstance::new("n1", "summarize")
            .with_config("length", "short")
            .with_config("status", "done")
            .with_config("output", "old");
        let snapshot = node.snapshot();
        assert_eq!(snapshot.config_str("length"), Some("short"));
        assert!(snapshot.config().get("status").is_none());
        assert!(snapshot.config().get("output").is_none());
    }

    #[test]
    fn parses_stored_record() {
        let json = json!({
            "id": "wf_1700000000000",
            "name": "Summarize page",
            "nodes": [
                { "id": "n1", "type": "getPageText", "data": { "status": "idle" },
                  "position": { "x": 10.0, "y": 20.0 } },
                { "id": "n2", "type": "summarize", "data": { "type": "tldr", "length": "short" } }
            ],
            "edges": [ { "id": "e1", "source": "n1", "target": "n2" } ],
            "createdAt": 1700000000000i64,
            "updatedAt": 1700000005000i64
        })
        .to_string();

        let workflow = Workflow::from_json(&json).expect("valid record");
        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.nodes[1].node_type, "summarize");
        assert_eq!(workflow.created_at.timestamp_millis(), 1_700_000_000_000);

        let back: Workflow = serde_json::from_str(&workflow.to_json().unwrap()).unwrap();
        assert_eq!(back, workflow);
    }

    #[test]
    fn from_json_rejects_broken_record() {
        let json = json!({
            "id": "wf_1", "name": "broken",
            "nodes": [ { "id": "n1", "type": "summarize" } ],
            "edges": [ { "id": "e1", "source": "n0", "target": "n1" } ],
            "createdAt": 0, "updatedAt": 0
        })
        .to_string();
        assert!(matches!(
            Workflow::from_json(&json),
            Err(FlowError::Workflow(WorkflowError::DanglingEdge { .. }))
        ));
    }
}
