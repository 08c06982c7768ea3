//! Execution order resolution.
//!
//! Orders nodes with Kahn's algorithm. Ties between nodes that become
//! runnable at the same time are broken by queue insertion order: the
//! initial queue is seeded in the workflow's node order, and successors are
//! enqueued in the order their edges appear. The result is therefore a pure
//! function of `(nodes, edges)`.
//!
//! Nodes that never reach in-degree zero (members of a cycle and anything
//! downstream of one) are left out of the order and reported as unscheduled.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use sheetcore::{Edge, NodeId, NodeInstance, WorkflowError};
use std::collections::{HashMap, VecDeque};

/// What to do when the graph is not a DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Run the schedulable part and silently drop the rest.
    #[default]
    Lenient,
    /// Refuse to run a workflow containing a cycle.
    Strict,
}

/// A resolved schedule.
#[derive(Debug, Clone)]
pub struct ExecutionPlan<'a> {
    pub order: Vec<&'a NodeInstance>,
    /// Nodes that could not be scheduled, in node order.
    pub unscheduled: Vec<&'a NodeInstance>,
}

impl<'a> ExecutionPlan<'a> {
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.order.iter().map(|n| n.id.clone()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty()
    }
}

/// Compute one topological order of `nodes`. Never fails; see the module docs
/// for how cycles degrade.
pub fn execution_order<'a>(nodes: &'a [NodeInstance], edges: &[Edge]) -> ExecutionPlan<'a> {
    let index = index_nodes(nodes);
    let mut in_degree = vec![0usize; nodes.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for edge in edges {
        let Some(&target) = index.get(edge.target.as_str()) else {
            continue;
        };
        // An edge from an unknown source still counts against its target.
        in_degree[target] += 1;
        if let Some(&source) = index.get(edge.source.as_str()) {
            successors[source].push(target);
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut scheduled = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(current) = queue.pop_front() {
        scheduled[current] = true;
        order.push(&nodes[current]);

        for &next in &successors[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    let unscheduled = nodes
        .iter()
        .enumerate()
        .filter(|(i, _)| !scheduled[*i])
        .map(|(_, n)| n)
        .collect();

    ExecutionPlan { order, unscheduled }
}

/// Resolve the order and apply the cycle policy.
pub fn resolve<'a>(
    nodes: &'a [NodeInstance],
    edges: &[Edge],
    policy: CyclePolicy,
) -> Result<ExecutionPlan<'a>, WorkflowError> {
    let plan = execution_order(nodes, edges);
    if plan.is_complete() {
        return Ok(plan);
    }

    let mut members = cycle_members(nodes, edges);
    if members.is_empty() {
        members = plan.unscheduled.iter().map(|n| n.id.clone()).collect();
    }

    match policy {
        CyclePolicy::Strict => Err(WorkflowError::CyclicDependency { nodes: members }),
        CyclePolicy::Lenient => {
            let dropped: Vec<&str> = plan.unscheduled.iter().map(|n| n.id.as_str()).collect();
            tracing::warn!(
                cycle = ?members,
                dropped = ?dropped,
                "Workflow graph contains a cycle; dropping unschedulable nodes"
            );
            Ok(plan)
        }
    }
}

/// Ids of nodes that sit on a cycle, in node order.
pub fn cycle_members(nodes: &[NodeInstance], edges: &[Edge]) -> Vec<NodeId> {
    let index = index_nodes(nodes);
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let handles: Vec<NodeIndex> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();

    for edge in edges {
        if let (Some(&s), Some(&t)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
            graph.add_edge(handles[s], handles[t], ());
        }
    }

    let mut members: Vec<usize> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|idx| graph[idx])
        .collect();
    members.sort_unstable();
    members.into_iter().map(|i| nodes[i].id.clone()).collect()
}

fn index_nodes(nodes: &[NodeInstance]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<NodeInstance> {
        ids.iter().map(|id| NodeInstance::new(*id, "mock")).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .map(|(s, t)| Edge {
                id: format!("e{}-{}", s, t),
                source: s.to_string(),
                target: t.to_string(),
            })
            .collect()
    }

    fn ids(plan: &ExecutionPlan<'_>) -> Vec<String> {
        plan.node_ids()
    }

    #[test]
    fn linear_chain_in_edge_order() {
        let n = nodes(&["c", "b", "a"]);
        let e = edges(&[("a", "b"), ("b", "c")]);
        assert_eq!(ids(&execution_order(&n, &e)), vec!["a", "b", "c"]);
    }

    #[test]
    fn every_edge_points_forward() {
        let n = nodes(&["d", "a", "c", "b", "e"]);
        let e = edges(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("d", "e"), ("a", "e")]);
        let order = ids(&execution_order(&n, &e));
        assert_eq!(order.len(), 5);
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        for edge in &e {
            assert!(pos(&edge.source) < pos(&edge.target), "{} before {}", edge.source, edge.target);
        }
    }

    #[test]
    fn ties_follow_node_order() {
        let n = nodes(&["x", "y", "z"]);
        assert_eq!(ids(&execution_order(&n, &[])), vec!["x", "y", "z"]);

        let n = nodes(&["a", "c", "b"]);
        let e = edges(&[("a", "c"), ("a", "b")]);
        // Successors are released in edge order.
        assert_eq!(ids(&execution_order(&n, &e)), vec!["a", "c", "b"]);
    }

    #[test]
    fn repeated_resolution_is_identical() {
        let n = nodes(&["n1", "n2", "n3", "n4", "n5"]);
        let e = edges(&[("n1", "n3"), ("n2", "n3"), ("n3", "n5"), ("n4", "n5")]);
        let first = ids(&execution_order(&n, &e));
        for _ in 0..20 {
            assert_eq!(ids(&execution_order(&n, &e)), first);
        }
        assert_eq!(first, vec!["n1", "n2", "n4", "n3", "n5"]);
    }

    #[test]
    fn disconnected_nodes_run_first_pass() {
        let n = nodes(&["a", "b", "solo"]);
        let e = edges(&[("a", "b")]);
        assert_eq!(ids(&execution_order(&n, &e)), vec!["a", "solo", "b"]);
    }

    #[test]
    fn two_cycle_schedules_nothing() {
        let n = nodes(&["a", "b"]);
        let e = edges(&[("a", "b"), ("b", "a")]);
        let plan = execution_order(&n, &e);
        assert!(plan.order.is_empty());
        assert_eq!(plan.unscheduled.len(), 2);
    }

    #[test]
    fn cycle_drops_downstream_but_keeps_prefix() {
        let n = nodes(&["start", "a", "b", "after", "free"]);
        let e = edges(&[("start", "a"), ("a", "b"), ("b", "a"), ("b", "after")]);
        let plan = execution_order(&n, &e);
        assert_eq!(ids(&plan), vec!["start", "free"]);
        let dropped: Vec<_> = plan.unscheduled.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(dropped, vec!["a", "b", "after"]);
        assert_eq!(cycle_members(&n, &e), vec!["a", "b"]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let n = nodes(&["a", "b"]);
        let e = edges(&[("a", "a")]);
        assert_eq!(ids(&execution_order(&n, &e)), vec!["b"]);
        assert_eq!(cycle_members(&n, &e), vec!["a"]);
    }

    #[test]
    fn strict_policy_rejects_cycles() {
        let n = nodes(&["a", "b", "c"]);
        let e = edges(&[("a", "b"), ("b", "c"), ("c", "b")]);
        assert_eq!(
            resolve(&n, &e, CyclePolicy::Strict).unwrap_err(),
            WorkflowError::CyclicDependency { nodes: vec!["b".into(), "c".into()] }
        );
        let plan = resolve(&n, &e, CyclePolicy::Lenient).unwrap();
        assert_eq!(ids(&plan), vec!["a"]);
    }

    #[test]
    fn strict_policy_accepts_dags() {
        let n = nodes(&["a", "b"]);
        let e = edges(&[("a", "b")]);
        assert!(resolve(&n, &e, CyclePolicy::Strict).unwrap().is_complete());
    }
}
