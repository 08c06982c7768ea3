use crate::input::InputPolicy;
use crate::order::CyclePolicy;
use crate::registry::NodeRegistry;
use crate::store::{require_workflow, MemoryStore, WorkflowStore};
use crate::{ExecutionContext, ExecutionResult, WorkflowExecutor};
use serde::{Deserialize, Serialize};
use sheetcore::{EventBus, ExecutionEvent, FlowError, Workflow};
use std::sync::Arc;

/// Main runtime for executing workflows
pub struct SheetRuntime {
    registry: Arc<NodeRegistry>,
    executor: WorkflowExecutor,
    event_bus: Arc<EventBus>,
    store: Arc<dyn WorkflowStore>,
}

impl SheetRuntime {
    /// Create a runtime over a pre-configured registry, with an in-memory store
    pub fn with_registry(registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        Self::with_store(registry, Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(
        registry: Arc<NodeRegistry>,
        store: Arc<dyn WorkflowStore>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            executor: WorkflowExecutor::from_config(&config),
            event_bus: Arc::new(EventBus::new(config.event_buffer_size)),
            registry,
            store,
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /// Check a workflow against the registry and persist it.
    pub async fn save_workflow(&self, workflow: Workflow) -> Result<(), FlowError> {
        self.registry.validate_workflow(&workflow)?;
        self.store.save(workflow).await
    }

    /// Run a workflow and return the output of the last node that ran.
    pub async fn execute(&self, workflow: &Workflow, ctx: &ExecutionContext) -> Result<String, FlowError> {
        self.run(workflow, ctx).await.map(|r| r.final_output)
    }

    /// Run a workflow and return the full result.
    pub async fn run(&self, workflow: &Workflow, ctx: &ExecutionContext) -> Result<ExecutionResult, FlowError> {
        self.executor
            .execute(workflow, &self.registry, &self.event_bus, ctx)
            .await
    }

    /// Load a stored workflow by id and run its own copy.
    pub async fn execute_workflow(&self, workflow_id: &str, ctx: &ExecutionContext) -> Result<String, FlowError> {
        let workflow = require_workflow(self.store.as_ref(), workflow_id).await?;
        self.execute(&workflow, ctx).await
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub cycle_policy: CyclePolicy,
    pub input_policy: InputPolicy,
    pub event_buffer_size: usize,
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn strict(mut self) -> Self {
        self.cycle_policy = CyclePolicy::Strict;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_policy: CyclePolicy::Lenient,
            input_policy: InputPolicy::FirstEdge,
            event_buffer_size: 1000,
        }
    }
}
