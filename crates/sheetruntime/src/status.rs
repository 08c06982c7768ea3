use crate::Callbacks;
use serde_json::Value;
use sheetcore::{NodeId, NodeStatus, Workflow};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeView {
    pub status: NodeStatus,
    pub output: Option<String>,
}

/// Display state of a workflow's nodes, kept apart from the node snapshots
/// executors receive.
///
/// Transitions: start sets `Running`, complete sets `Done` with the output,
/// error reverts to `Idle` and keeps the previous output.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    views: Arc<Mutex<HashMap<NodeId, NodeView>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, node_id: &str) -> NodeStatus {
        self.lock().get(node_id).map(|v| v.status).unwrap_or_default()
    }

    pub fn output(&self, node_id: &str) -> Option<String> {
        self.lock().get(node_id).and_then(|v| v.output.clone())
    }

    pub fn view(&self, node_id: &str) -> NodeView {
        self.lock().get(node_id).cloned().unwrap_or_default()
    }

    /// Forget everything; every node reads as idle again.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Wrap `callbacks` so each event updates the board first and then
    /// reaches the host.
    pub fn attach(&self, callbacks: Callbacks) -> Callbacks {
        let start_board = self.clone();
        let start_host = callbacks.clone();
        let complete_board = self.clone();
        let complete_host = callbacks.clone();
        let error_board = self.clone();
        let error_host = callbacks;

        Callbacks::new()
            .on_node_start(move |id| {
                start_board.lock().entry(id.to_string()).or_default().status = NodeStatus::Running;
                start_host.node_started(id);
            })
            .on_node_complete(move |id, output| {
                let mut views = complete_board.lock();
                let view = views.entry(id.to_string()).or_default();
                view.status = NodeStatus::Done;
                view.output = Some(output.to_string());
                drop(views);
                complete_host.node_completed(id, output);
            })
            .on_node_error(move |id, message| {
                error_board.lock().entry(id.to_string()).or_default().status = NodeStatus::Idle;
                error_host.node_failed(id, message);
            })
    }

    /// Write `status` and `output` into each node's data bag, for hosts that
    /// persist or render the workflow record directly.
    pub fn apply_to(&self, workflow: &mut Workflow) {
        let views = self.lock();
        for node in &mut workflow.nodes {
            let view = views.get(&node.id).cloned().unwrap_or_default();
            let status = serde_json::to_value(view.status).unwrap_or(Value::Null);
            node.data.insert("status".into(), status);
            match view.output {
                Some(output) => {
                    node.data.insert("output".into(), Value::String(output));
                }
                None => {
                    node.data.remove("output");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NodeId, NodeView>> {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
