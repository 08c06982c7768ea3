//! Built-in node library
//!
//! The page, AI and display nodes a Flosheet host registers at startup.
//! Each node talks to the host through the capability traits in [`services`].

mod display;
mod page;
mod prompt;
pub mod services;
mod summarize;
mod translate;

pub use display::{text_output_metadata, PageModalNode, SelectionPopoverNode};
pub use page::{GetPageTextNode, GetSelectionNode};
pub use prompt::{PromptConfig, PromptNode};
pub use services::{
    Availability, LanguageModel, Modal, PageBridge, Popover, Services, Summarizer, Translator,
};
pub use summarize::{SummarizeConfig, SummarizeNode, SummaryLength, SummaryType};
pub use translate::{TranslateConfig, TranslateNode};

use sheetruntime::NodeRegistry;
use std::sync::Arc;

/// Register all built-in nodes with a registry
pub fn register_all(registry: &mut NodeRegistry, services: &Services) {
    registry.register(
        GetPageTextNode::metadata(),
        Some(Arc::new(GetPageTextNode::new(services.page.clone()))),
    );
    registry.register(
        GetSelectionNode::metadata(),
        Some(Arc::new(GetSelectionNode::new(services.page.clone()))),
    );
    registry.register(
        SummarizeNode::metadata(),
        Some(Arc::new(SummarizeNode::new(services.summarizer.clone()))),
    );
    registry.register(
        TranslateNode::metadata(),
        Some(Arc::new(TranslateNode::new(services.translator.clone()))),
    );
    registry.register(
        PromptNode::metadata(),
        Some(Arc::new(PromptNode::new(services.language_model.clone()))),
    );
    registry.register(text_output_metadata(), None);
    registry.register(
        PageModalNode::metadata(),
        Some(Arc::new(PageModalNode::new(services.page.clone()))),
    );
    registry.register(
        SelectionPopoverNode::metadata(),
        Some(Arc::new(SelectionPopoverNode::new(services.page.clone()))),
    );
}
