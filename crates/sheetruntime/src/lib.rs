//! Workflow execution runtime
//!
//! This crate provides the engine that runs workflows: the node registry,
//! the execution order resolver, input propagation and the sequential
//! executor, plus the runtime facade hosts talk to.

mod context;
mod executor;
pub mod input;
pub mod order;
mod registry;
mod runtime;
mod status;
mod store;

pub use context::{Callbacks, ExecutionContext, NodeCompleteFn, NodeErrorFn, NodeStartFn};
pub use executor::{ExecutionResult, WorkflowExecutor};
pub use input::{input_for, InputPolicy};
pub use order::{execution_order, resolve, CyclePolicy, ExecutionPlan};
pub use registry::{NodeMetadata, NodeRegistry, RegistryEntry};
pub use runtime::{RuntimeConfig, SheetRuntime};
pub use status::{NodeView, StatusBoard};
pub use store::{require_workflow, MemoryStore, WorkflowStore};
