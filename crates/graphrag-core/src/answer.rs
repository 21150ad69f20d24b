//! Answer generator: summarize retrieved rows into a grounded answer.

use crate::error::GenerationError;
use crate::generate::DEFAULT_CACHE_CAPACITY;
use crate::llm::{OutputShape, StructuredGenerator};
use crate::{parse, prompts};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Synthesizes a natural language answer from a question, the chosen query,
/// and the serialized result context. The orchestrator never calls this with
/// empty context; the empty case is answered upstream with the fixed
/// insufficient-information string.
///
/// Memoized with the same discipline as [`crate::QueryGenerator`], keyed on
/// the exact `(question, query, context)` triple.
pub struct AnswerGenerator<G> {
    llm: Arc<G>,
    cache: Mutex<LruCache<(String, String, String), String>>,
}

impl<G: StructuredGenerator> AnswerGenerator<G> {
    pub fn new(llm: Arc<G>) -> Self {
        Self::with_capacity(llm, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(llm: Arc<G>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least one");
        Self {
            llm,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn generate(
        &self,
        question: &str,
        query: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        let key = (
            question.to_string(),
            query.to_string(),
            context.to_string(),
        );

        if let Some(cached) = self.cache.lock().get(&key).cloned() {
            debug!(question, "answer generation served from cache");
            return Ok(cached);
        }

        let prompt = prompts::answer_prompt(question, query, context);
        let raw = self
            .llm
            .generate_structured(&prompt, OutputShape::Answer)
            .await?;
        let answer = parse::parse_answer(&raw)?;

        self.cache.lock().put(key, answer.clone());
        Ok(answer)
    }
}
