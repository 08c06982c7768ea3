use async_trait::async_trait;
use chrono::Utc;
use sheetcore::{FlowError, Workflow, WorkflowError};
use tokio::sync::RwLock;

/// Where workflow definitions live between runs.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Insert or replace by id.
    async fn save(&self, workflow: Workflow) -> Result<(), FlowError>;

    async fn load_all(&self) -> Result<Vec<Workflow>, FlowError>;

    async fn load_by_id(&self, id: &str) -> Result<Option<Workflow>, FlowError>;

    /// Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<(), FlowError>;
}

/// In-process store. Keeps workflows in the order they were first saved.
#[derive(Default)]
pub struct MemoryStore {
    workflows: RwLock<Vec<Workflow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn save(&self, mut workflow: Workflow) -> Result<(), FlowError> {
        workflow.validate()?;
        let now = Utc::now();
        workflow.updated_at = now;

        let mut workflows = self.workflows.write().await;
        match workflows.iter().position(|w| w.id == workflow.id) {
            Some(index) => workflows[index] = workflow,
            None => {
                workflow.created_at = now;
                tracing::info!("Saving new workflow: {}", workflow.id);
                workflows.push(workflow);
            }
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Workflow>, FlowError> {
        Ok(self.workflows.read().await.clone())
    }

    async fn load_by_id(&self, id: &str) -> Result<Option<Workflow>, FlowError> {
        Ok(self.workflows.read().await.iter().find(|w| w.id == id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), FlowError> {
        self.workflows.write().await.retain(|w| w.id != id);
        Ok(())
    }
}

/// Load a workflow or fail with `NotFound`.
pub async fn require_workflow(store: &dyn WorkflowStore, id: &str) -> Result<Workflow, FlowError> {
    store
        .load_by_id(id)
        .await?
        .ok_or_else(|| FlowError::Workflow(WorkflowError::NotFound(id.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    fn workflow(id: &str, name: &str) -> Workflow {
        let mut workflow = Workflow::new(name).with_id(id);
        workflow.created_at = Utc.timestamp_millis_opt(0).unwrap();
        workflow.updated_at = workflow.created_at;
        workflow
    }

    #[tokio::test]
    async fn save_inserts_then_replaces() {
        let store = MemoryStore::new();
        store.save(workflow("wf_1", "first")).await.unwrap();
        store.save(workflow("wf_2", "second")).await.unwrap();

        let stored = store.load_by_id("wf_1").await.unwrap().unwrap();
        assert!(stored.created_at.timestamp_millis() > 0);
        let created = stored.created_at;

        let mut edited = stored.clone();
        edited.name = "renamed".into();
        edited.add_node("summarize", Map::new());
        store.save(edited).await.unwrap();

        let all = store.load_all().await.unwrap();
        let names: Vec<_> = all.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["renamed", "second"]);
        assert_eq!(all[0].created_at, created);
        assert!(all[0].updated_at >= created);
        assert_eq!(all[0].nodes.len(), 1);
    }

    #[tokio::test]
    async fn delete_and_missing_lookups() {
        let store = MemoryStore::new();
        store.save(workflow("wf_1", "only")).await.unwrap();
        store.delete("wf_1").await.unwrap();
        store.delete("wf_1").await.unwrap();

        assert!(store.load_by_id("wf_1").await.unwrap().is_none());
        assert!(matches!(
            require_workflow(&store, "wf_1").await,
            Err(FlowError::Workflow(WorkflowError::NotFound(id))) if id == "wf_1"
        ));
    }

    #[tokio::test]
    async fn save_rejects_broken_records() {
        let store = MemoryStore::new();
        let mut broken = workflow("wf_1", "broken");
        broken.connect("n1", "n2");
        assert!(store.save(broken).await.is_err());
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
