use crate::services::{page_unavailable, PageBridge};
use async_trait::async_trait;
use sheetcore::{NodeCategory, NodeContext, NodeError, NodeExecutor};
use sheetruntime::NodeMetadata;
use std::sync::Arc;

/// Extract the readable text of the target page.
pub struct GetPageTextNode {
    page: Option<Arc<dyn PageBridge>>,
}

impl GetPageTextNode {
    pub const NODE_TYPE: &'static str = "getPageText";

    pub fn new(page: Option<Arc<dyn PageBridge>>) -> Self {
        Self { page }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Get Page Text", NodeCategory::Input)
            .with_description("Extract readable text from the current page")
    }
}

#[async_trait]
impl NodeExecutor for GetPageTextNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        let page = self.page.as_ref().ok_or_else(page_unavailable)?;

        // Extraction failures become the node's output rather than stopping the run.
        match page.page_text(ctx.tab_id, ctx.page.as_ref()).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(node_id = %ctx.node.id, "Failed to get page text: {}", e);
                Ok(format!("Error: {}", e))
            }
        }
    }
}

/// Text the user has selected on the page.
pub struct GetSelectionNode {
    page: Option<Arc<dyn PageBridge>>,
}

impl GetSelectionNode {
    pub const NODE_TYPE: &'static str = "getSelection";

    pub fn new(page: Option<Arc<dyn PageBridge>>) -> Self {
        Self { page }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Get Selected Text", NodeCategory::Input)
            .with_description("Get the text currently selected on the page")
    }
}

#[async_trait]
impl NodeExecutor for GetSelectionNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        if let Some(selection) = ctx.page.as_ref().and_then(|p| p.selection()) {
            return Ok(selection.to_string());
        }

        let page = self.page.as_ref().ok_or_else(page_unavailable)?;
        let selected = page.selected_text(ctx.tab_id).await?;
        if selected.trim().is_empty() {
            return Err(NodeError::NoSelection);
        }
        Ok(selected)
    }
}
