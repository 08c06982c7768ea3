//! Capabilities the host provides to the built-in nodes.
//!
//! The nodes only decide what to ask for and how to report failures; the
//! actual page access and model calls live behind these traits.

use crate::summarize::SummarizeConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sheetcore::{NodeError, PageContext, SelectionRect, TabId};
use std::sync::Arc;

/// Access to the page a workflow targets.
#[async_trait]
pub trait PageBridge: Send + Sync {
    /// Readable text of the page.
    async fn page_text(&self, tab_id: TabId, page: Option<&PageContext>) -> Result<String, NodeError>;

    /// Text currently selected on the page. May be empty.
    async fn selected_text(&self, tab_id: TabId) -> Result<String, NodeError>;

    async fn show_modal(&self, tab_id: TabId, modal: &Modal) -> Result<(), NodeError>;

    async fn show_popover(&self, tab_id: TabId, popover: &Popover) -> Result<(), NodeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub title: String,
    /// Markdown; rendering is up to the host.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popover {
    pub text: String,
    /// Where the selection was; `None` centres the popover.
    pub anchor: Option<SelectionRect>,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, options: &SummarizeConfig) -> Result<String, NodeError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, NodeError>;
}

/// Model readiness as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Downloadable,
    Downloading,
    Unavailable,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn availability(&self) -> Availability;

    async fn prompt(&self, text: &str) -> Result<String, NodeError>;
}

/// The capabilities available in the current host. Missing ones make the
/// nodes that need them fail with `NodeError::Unavailable`.
#[derive(Clone, Default)]
pub struct Services {
    pub page: Option<Arc<dyn PageBridge>>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub translator: Option<Arc<dyn Translator>>,
    pub language_model: Option<Arc<dyn LanguageModel>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Arc<dyn PageBridge>) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_language_model(mut self, language_model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(language_model);
        self
    }
}

pub(crate) fn page_unavailable() -> NodeError {
    NodeError::Unavailable("Page access is not available in this context".to_string())
}
