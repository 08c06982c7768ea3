use crate::services::Translator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sheetcore::{parse_config, NodeCategory, NodeContext, NodeError, NodeExecutor};
use sheetruntime::NodeMetadata;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateConfig {
    #[serde(default = "default_source")]
    pub source_language: String,
    #[serde(default = "default_target")]
    pub target_language: String,
}

fn default_source() -> String {
    "en".to_string()
}

fn default_target() -> String {
    "fr".to_string()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            source_language: default_source(),
            target_language: default_target(),
        }
    }
}

pub struct TranslateNode {
    translator: Option<Arc<dyn Translator>>,
}

impl TranslateNode {
    pub const NODE_TYPE: &'static str = "translate";

    pub fn new(translator: Option<Arc<dyn Translator>>) -> Self {
        Self { translator }
    }

    pub fn metadata() -> NodeMetadata {
        NodeMetadata::new(Self::NODE_TYPE, "Translate", NodeCategory::Processing)
            .with_description("Translate text between languages")
            .with_default("sourceLanguage", "en")
            .with_default("targetLanguage", "fr")
    }
}

#[async_trait]
impl NodeExecutor for TranslateNode {
    async fn execute(&self, ctx: NodeContext) -> Result<String, NodeError> {
        let input = ctx.require_input("translate")?;
        let translator = self
            .translator
            .as_ref()
            .ok_or_else(|| NodeError::Unavailable("Translator API not available".to_string()))?;

        let config: TranslateConfig = ctx.node.typed_config()?;
        tracing::debug!(
            node_id = %ctx.node.id,
            "Translating {} -> {}",
            config.source_language,
            config.target_language
        );
        translator
            .translate(input, &config.source_language, &config.target_language)
            .await
    }

    fn validate_config(&self, config: &Map<String, Value>) -> Result<(), NodeError> {
        let parsed: TranslateConfig = parse_config(config)?;
        if parsed.source_language.trim().is_empty() || parsed.target_language.trim().is_empty() {
            return Err(NodeError::Configuration("language codes must not be empty".into()));
        }
        Ok(())
    }
}
