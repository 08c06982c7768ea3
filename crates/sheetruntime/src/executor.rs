use crate::input::{input_for, InputPolicy};
use crate::order::{self, CyclePolicy};
use crate::registry::NodeRegistry;
use crate::{ExecutionContext, RuntimeConfig};
use chrono::Utc;
use sheetcore::{
    EventBus, ExecutionEvent, ExecutionId, FlowError, NodeContext, NodeId, Workflow,
};
use std::collections::HashMap;
use std::time::Instant;

/// Runs a workflow's nodes one at a time in resolved order.
///
/// There is no parallel fan-out: each executor call is awaited before the
/// next node starts. The first executor error stops the run.
pub struct WorkflowExecutor {
    cycle_policy: CyclePolicy,
    input_policy: InputPolicy,
}

impl WorkflowExecutor {
    pub fn new(cycle_policy: CyclePolicy, input_policy: InputPolicy) -> Self {
        Self {
            cycle_policy,
            input_policy,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.cycle_policy, config.input_policy.clone())
    }

    /// Execute a workflow and return results
    pub async fn execute(
        &self,
        workflow: &Workflow,
        registry: &NodeRegistry,
        event_bus: &EventBus,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, FlowError> {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();

        event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            workflow_id: workflow.id.clone(),
            mode: ctx.mode,
            timestamp: Utc::now(),
        });

        tracing::info!(%execution_id, mode = ?ctx.mode, "Starting workflow execution: {}", workflow.id);

        let result = self
            .run_nodes(workflow, registry, event_bus, ctx, execution_id, start_time)
            .await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let success = result.is_ok();

        event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });

        match &result {
            Ok(r) => tracing::info!(
                %execution_id,
                "Workflow {} finished: {} nodes in {}ms",
                workflow.id,
                r.completed_nodes(),
                duration_ms
            ),
            Err(e) => tracing::error!(%execution_id, "Workflow {} failed: {}", workflow.id, e),
        }

        result
    }

    async fn run_nodes(
        &self,
        workflow: &Workflow,
        registry: &NodeRegistry,
        event_bus: &EventBus,
        ctx: &ExecutionContext,
        execution_id: ExecutionId,
        start_time: Instant,
    ) -> Result<ExecutionResult, FlowError> {
        workflow.validate()?;
        let plan = order::resolve(&workflow.nodes, &workflow.edges, self.cycle_policy)?;
        tracing::debug!(order = ?plan.node_ids(), "Resolved execution order");

        let workflow_name = ctx
            .workflow_name
            .clone()
            .unwrap_or_else(|| workflow.name.clone());

        let mut node_outputs: HashMap<NodeId, String> = HashMap::new();
        let mut outputs = Vec::with_capacity(plan.order.len());
        let mut skipped_nodes = Vec::new();
        let mut final_output = String::new();

        for node in &plan.order {
            let Some(entry) = registry.lookup(&node.node_type) else {
                tracing::warn!(node_id = %node.id, "Unknown node type: {}", node.node_type);
                event_bus.emit(ExecutionEvent::NodeSkipped {
                    execution_id,
                    node_id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    timestamp: Utc::now(),
                });
                skipped_nodes.push(node.id.clone());
                continue;
            };

            ctx.callbacks.node_started(&node.id);
            event_bus.emit(ExecutionEvent::NodeStarted {
                execution_id,
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                timestamp: Utc::now(),
            });

            let input = input_for(&node.id, &workflow.edges, &node_outputs, &self.input_policy);
            tracing::debug!(node_id = %node.id, input_len = input.len(), "Running node");
            let node_start = Instant::now();

            let output = match &entry.executor {
                Some(executor) => {
                    let node_ctx = NodeContext {
                        node: node.snapshot(),
                        input,
                        tab_id: ctx.tab_id,
                        mode: ctx.mode,
                        page: ctx.page_context.clone(),
                        workflow_name: Some(workflow_name.clone()),
                    };

                    match executor.execute(node_ctx).await {
                        Ok(output) => output,
                        Err(e) => {
                            let message = e.to_string();
                            tracing::error!(node_id = %node.id, "Node {} failed: {}", node.id, message);
                            ctx.callbacks.node_failed(&node.id, &message);
                            event_bus.emit(ExecutionEvent::NodeFailed {
                                execution_id,
                                node_id: node.id.clone(),
                                error: message,
                                timestamp: Utc::now(),
                            });
                            return Err(FlowError::NodeFailed {
                                node_id: node.id.clone(),
                                source: e,
                            });
                        }
                    }
                }
                // Display-only node: its output is whatever it received.
                None => input,
            };

            let duration_ms = node_start.elapsed().as_millis() as u64;
            tracing::info!(node_id = %node.id, "Node {} completed in {}ms", node.id, duration_ms);

            node_outputs.insert(node.id.clone(), output.clone());
            final_output = output.clone();
            ctx.callbacks.node_completed(&node.id, &output);
            event_bus.emit(ExecutionEvent::NodeCompleted {
                execution_id,
                node_id: node.id.clone(),
                output: output.clone(),
                duration_ms,
                timestamp: Utc::now(),
            });
            outputs.push((node.id.clone(), output));
        }

        Ok(ExecutionResult {
            execution_id,
            final_output,
            outputs,
            skipped_nodes,
            unscheduled_nodes: plan.unscheduled.iter().map(|n| n.id.clone()).collect(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

impl Default for WorkflowExecutor {
    fn default() -> Self {
        Self::new(CyclePolicy::default(), InputPolicy::default())
    }
}

/// Result of workflow execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    /// Output of the last node that ran, or empty if none did.
    pub final_output: String,
    /// Recorded outputs, in execution order.
    pub outputs: Vec<(NodeId, String)>,
    /// Nodes whose type is not registered.
    pub skipped_nodes: Vec<NodeId>,
    /// Nodes left out because of a cycle.
    pub unscheduled_nodes: Vec<NodeId>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn completed_nodes(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_of(&self, node_id: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, output)| output.as_str())
    }
}
