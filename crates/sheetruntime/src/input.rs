//! Input propagation: what a node receives when it runs.

use serde::{Deserialize, Serialize};
use sheetcore::{Edge, NodeId};
use std::collections::HashMap;

/// How a node with several incoming edges builds its input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum InputPolicy {
    /// Use the first incoming edge (by edge order) and ignore the others.
    #[default]
    FirstEdge,
    /// Join the outputs of every incoming edge, in edge order. Sources
    /// without an output are left out.
    Concatenate { separator: String },
}

/// Input for `node_id` given the outputs recorded so far.
///
/// A node without incoming edges gets the empty string, as does a node whose
/// source has not produced anything.
pub fn input_for(
    node_id: &str,
    edges: &[Edge],
    outputs: &HashMap<NodeId, String>,
    policy: &InputPolicy,
) -> String {
    let mut sources = edges.iter().filter(|e| e.target == node_id).map(|e| e.source.as_str());

    match policy {
        InputPolicy::FirstEdge => sources
            .next()
            .and_then(|source| outputs.get(source))
            .cloned()
            .unwrap_or_default(),
        InputPolicy::Concatenate { separator } => sources
            .filter_map(|source| outputs.get(source).map(String::as_str))
            .collect::<Vec<_>>()
            .join(separator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            id: format!("e{}-{}", source, target),
            source: source.into(),
            target: target.into(),
        }
    }

    fn outputs(pairs: &[(&str, &str)]) -> HashMap<NodeId, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn no_incoming_edge_means_empty_input() {
        let edges = vec![edge("a", "b")];
        let out = outputs(&[("a", "text")]);
        assert_eq!(input_for("a", &edges, &out, &InputPolicy::FirstEdge), "");
        assert_eq!(input_for("lonely", &[], &out, &InputPolicy::FirstEdge), "");
    }

    #[test]
    fn single_edge_forwards_source_output() {
        let edges = vec![edge("a", "b")];
        let out = outputs(&[("a", "page text")]);
        assert_eq!(input_for("b", &edges, &out, &InputPolicy::FirstEdge), "page text");
    }

    #[test]
    fn first_edge_wins() {
        let edges = vec![edge("x", "t"), edge("y", "t")];
        let out = outputs(&[("x", "from x"), ("y", "from y")]);
        assert_eq!(input_for("t", &edges, &out, &InputPolicy::FirstEdge), "from x");
    }

    #[test]
    fn first_edge_without_output_is_empty() {
        // Falls back to "" even though a later edge has output.
        let edges = vec![edge("x", "t"), edge("y", "t")];
        let out = outputs(&[("y", "from y")]);
        assert_eq!(input_for("t", &edges, &out, &InputPolicy::FirstEdge), "");
    }

    #[test]
    fn concatenate_joins_in_edge_order() {
        let edges = vec![edge("y", "t"), edge("x", "t"), edge("z", "t")];
        let out = outputs(&[("x", "one"), ("y", "two")]);
        let policy = InputPolicy::Concatenate { separator: "\n\n".into() };
        assert_eq!(input_for("t", &edges, &out, &policy), "two\n\none");
    }
}
