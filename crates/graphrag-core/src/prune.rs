//! Schema pruner: narrow a full graph schema to the question-relevant subset.

use crate::error::PipelineError;
use crate::llm::{OutputShape, StructuredGenerator};
use crate::{parse, prompts, GraphSchema};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reduces a full schema to the node/edge labels and properties judged
/// relevant to a question. Pruning has no retry budget: an unparseable
/// artifact is fatal for the whole run.
pub struct SchemaPruner<G> {
    llm: Arc<G>,
}

impl<G: StructuredGenerator> SchemaPruner<G> {
    pub fn new(llm: Arc<G>) -> Self {
        Self { llm }
    }

    pub async fn prune(
        &self,
        question: &str,
        full_schema: &GraphSchema,
    ) -> Result<GraphSchema, PipelineError> {
        let prompt = prompts::prune_prompt(question, &full_schema.to_json());
        let raw = self
            .llm
            .generate_structured(&prompt, OutputShape::PrunedSchema)
            .await?;

        let pruned = parse::parse_schema(&raw).map_err(PipelineError::SchemaParse)?;

        debug!(
            nodes = pruned.nodes.len(),
            edges = pruned.edges.len(),
            "pruned schema"
        );
        // Referential integrity of edge endpoints is advisory, not enforced.
        for label in pruned.dangling_edge_refs() {
            warn!(%label, "pruned schema edge references a label with no node");
        }

        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMError;
    use async_trait::async_trait;

    struct FixedGenerator(String);

    #[async_trait]
    impl StructuredGenerator for FixedGenerator {
        async fn generate_structured(
            &self,
            _prompt: &str,
            _shape: OutputShape,
        ) -> Result<String, LLMError> {
            Ok(self.0.clone())
        }
    }

    fn full_schema() -> GraphSchema {
        GraphSchema {
            nodes: vec![],
            edges: vec![],
        }
    }

    #[tokio::test]
    async fn prune_normalizes_bare_string_properties() {
        let pruner = SchemaPruner::new(Arc::new(FixedGenerator(
            r#"```json
{"nodes":[{"label":"Scholar","properties":["knownName"]}],"edges":[]}
```"#
                .to_string(),
        )));
        let pruned = pruner.prune("who won?", &full_schema()).await.unwrap();
        let props = pruned.nodes[0].properties.as_ref().unwrap();
        assert_eq!(props[0].name, "knownName");
        assert_eq!(props[0].type_tag, "string");
    }

    #[tokio::test]
    async fn unparseable_artifact_is_fatal() {
        let pruner = SchemaPruner::new(Arc::new(FixedGenerator("no json here".to_string())));
        let err = pruner.prune("who won?", &full_schema()).await.unwrap_err();
        assert!(matches!(err, PipelineError::SchemaParse(_)));
    }
}
