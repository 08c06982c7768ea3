use crate::services::Summarizer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sheetcore::{parse_config, NodeCategory, NodeContext, NodeError, NodeExecutor};
use sheetruntime::NodeMetadata;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryType {
    #[default]
    Tldr,
    KeyPoints,
    Teaser,
    Headline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarizeConfig {
    #[serde(rename = "type", default)]
    pub kind: SummaryType,
    #[serde(default)]
    pub length: SummaryLength,
}

pub struct SummarizeNode {
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl SummarizeNode {
    pub const NODE_TYPE: &'static str = "summarize";

    pub fn new(summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self { summarizer }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Summarize", NodeCategory::Processing)
            .with_description("Summarize the incoming text")
            .with_default("type", "tldr")
            .with_default("length", "medium")
    }
}

#[async_trait]
impl NodeExecutor for SummarizeNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        let input = ctx.require_input("summarize")?;
        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or_else(|| NodeError::Unavailable("Summarizer API not available".to_string()))?;

        let options: SummarizeConfig = ctx.node.typed_config()?;
        tracing::debug!(node_id = %ctx.node.id, ?options, "Summarizing {} chars", input.len());
        summarizer.summarize(input, &options).await
    }

    fn validate_config(&self, config: &Map<String, Value>) -> Result<(), NodeError> {
        parse_config::<SummarizeConfig>(config).map(|_| ())
    }
}
