use crate::services::{Availability, LanguageModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sheetcore::{parse_config, NodeCategory, NodeContext, NodeError, NodeExecutor};
use sheetruntime::NodeMetadata;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub prompt: String,
}

impl PromptConfig {
    /// The text sent to the model for a given input.
    pub fn compose(&self, input: &str) -> String {
        if input.is_empty() {
            self.prompt.clone()
        } else {
            format!("Input text: {}\n\nInstruction: {}", input, self.prompt)
        }
    }
}

/// Free-form instruction to the on-device language model.
pub struct PromptNode {
    model: Option<Arc<dyn LanguageModel>>,
}

impl PromptNode {
    pub const NODE_TYPE: &'static str = "prompt";

    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Prompt", NodeCategory::Processing)
            .with_description("Run a custom instruction against the input")
            .with_default("prompt", "")
    }
}

#[async_trait]
impl NodeExecutor for PromptNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| NodeError::Unavailable("Prompt API not available".to_string()))?;

        if model.availability().await == Availability::Unavailable {
            return Err(NodeError::Unavailable(
                "Language model is not available on this device".to_string(),
            ));
        }

        let config: PromptConfig = ctx.node.typed_config()?;
        let text = config.compose(&ctx.input);

        model.prompt(&text).await.map_err(|e| {
            if e.to_string().contains("download") {
                NodeError::Unavailable(
                    "Language model is downloading. Please try again in a few moments.".to_string(),
                )
            } else {
                e
            }
        })
    }

    fn validate_config(&self, config: &Map<String, Value>) -> Result<(), NodeError> {
        parse_config::<PromptConfig>(config).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_with_and_without_input() {
        let config = PromptConfig { prompt: "List the names".into() };
        assert_eq!(config.compose(""), "List the names");
        assert_eq!(
            config.compose("Ada met Alan"),
            "Input text: Ada met Alan\n\nInstruction: List the names"
        );
    }
}
