use crate::services::{page_unavailable, Modal, PageBridge, Popover};
use async_trait::async_trait;
use sheetcore::{NodeCategory, NodeContext, NodeError, NodeExecutor};
use sheetruntime::NodeMetadata;
use std::sync::Arc;

const DEFAULT_MODAL_TITLE: &str = "Flosheet Output";

/// Shows its input in the editor. Has no executor; the runtime passes the
/// input straight through.
pub fn text_output_metadata() -> NodeMetadata {
    NodeMetadata::new("textOutput", "Text Output", NodeCategory::Output)
        .with_description("Display the result")
}

/// Renders its input as a modal on the page.
pub struct PageModalNode {
    page: Option<Arc<dyn PageBridge>>,
}

impl PageModalNode {
    pub const NODE_TYPE: &'static str = "pageModal";

    pub fn new(page: Option<Arc<dyn PageBridge>>) -> Self {
        Self { page }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Page Modal", NodeCategory::Output)
            .with_description("Show the result in a modal on the page")
    }
}

#[async_trait]
impl NodeExecutor for PageModalNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        let body = ctx.require_input("display in modal")?;
        let page = self.page.as_ref().ok_or_else(page_unavailable)?;

        let title = match ctx.workflow_name.as_deref() {
            Some(name) if !name.is_empty() => format!("{} - Result", name),
            _ => DEFAULT_MODAL_TITLE.to_string(),
        };
        let modal = Modal {
            title,
            body: body.to_string(),
        };

        page.show_modal(ctx.tab_id, &modal).await.map_err(|e| {
            tracing::warn!(node_id = %ctx.node.id, "Failed to show modal: {}", e);
            NodeError::Failed("Failed to display modal on page".to_string())
        })?;
        Ok("Modal displayed".to_string())
    }
}

/// Shows its input next to the user's selection.
pub struct SelectionPopoverNode {
    page: Option<Arc<dyn PageBridge>>,
}

impl SelectionPopoverNode {
    pub const NODE_TYPE: &'static str = "selectionPopover";

    pub fn new(page: Option<Arc<dyn PageBridge>>) -> Self {
        Self { page }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Selection Popover", NodeCategory::Output)
            .with_description("Show the result in a popover near the selection")
    }
}

#[async_trait]
impl NodeExecutor for SelectionPopoverNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        let text = ctx.require_input("display in popover")?;
        let page = self.page.as_ref().ok_or_else(page_unavailable)?;

        let popover = Popover {
            text: text.to_string(),
            anchor: ctx.page.as_ref().and_then(|p| p.selection_rect),
        };

        page.show_popover(ctx.tab_id, &popover).await.map_err(|e| {
            tracing::warn!(node_id = %ctx.node.id, "Failed to show popover: {}", e);
            NodeError::Failed("Failed to display popover on page".to_string())
        })?;
        Ok("Popover displayed".to_string())
    }
}
