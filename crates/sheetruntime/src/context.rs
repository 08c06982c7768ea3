use sheetcore::{ExecutionMode, PageContext, TabId};
use std::fmt;
use std::sync::Arc;

pub type NodeStartFn = Arc<dyn Fn(&str) + Send + Sync>;
pub type NodeCompleteFn = Arc<dyn Fn(&str, &str) + Send + Sync>;
pub type NodeErrorFn = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Lifecycle hooks a host can attach to a run.
///
/// All three are optional and called synchronously from the run loop, so
/// they should return quickly. For a given node they fire as
/// start, then complete or error.
#[derive(Clone, Default)]
pub struct Callbacks {
    on_node_start: Option<NodeStartFn>,
    on_node_complete: Option<NodeCompleteFn>,
    on_node_error: Option<NodeErrorFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_node_start(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_node_start = Some(Arc::new(f));
        self
    }

    /// Called with `(node_id, output)`.
    pub fn on_node_complete(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_node_complete = Some(Arc::new(f));
        self
    }

    /// Called with `(node_id, message)`.
    pub fn on_node_error(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_node_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn node_started(&self, node_id: &str) {
        if let Some(f) = &self.on_node_start {
            f(node_id);
        }
    }

    pub(crate) fn node_completed(&self, node_id: &str, output: &str) {
        if let Some(f) = &self.on_node_complete {
            f(node_id, output);
        }
    }

    pub(crate) fn node_failed(&self, node_id: &str, message: &str) {
        if let Some(f) = &self.on_node_error {
            f(node_id, message);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_node_start", &self.on_node_start.is_some())
            .field("on_node_complete", &self.on_node_complete.is_some())
            .field("on_node_error", &self.on_node_error.is_some())
            .finish()
    }
}

/// Per-run parameters.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub tab_id: TabId,
    pub mode: ExecutionMode,
    pub page_context: Option<PageContext>,
    /// Overrides the workflow's own name when passed to executors.
    pub workflow_name: Option<String>,
    pub callbacks: Callbacks,
}

impl ExecutionContext {
    pub fn new(tab_id: TabId, mode: ExecutionMode) -> Self {
        Self {
            tab_id,
            mode,
            ..Default::default()
        }
    }

    pub fn visual(tab_id: TabId) -> Self {
        Self::new(tab_id, ExecutionMode::Visual)
    }

    pub fn headless(tab_id: TabId) -> Self {
        Self::new(tab_id, ExecutionMode::Headless)
    }

    pub fn with_page_context(mut self, page: PageContext) -> Self {
        self.page_context = Some(page);
        self
    }

    pub fn with_workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = Some(name.into());
        self
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}
