//! Query generator with bounded memoization.

use crate::error::GenerationError;
use crate::llm::{OutputShape, StructuredGenerator};
use crate::{parse, prompts, FailureAttempt, GraphSchema};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Default capacity of the generation memoization caches.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Exact-match memoization key: the full input triple of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GenKey {
    question: String,
    schema_json: String,
    history: Vec<FailureAttempt>,
}

/// Produces a candidate query from a question, a pruned schema, and the
/// ordered history of prior failed attempts.
///
/// Identical `(question, schema, history)` triples are served from a
/// process-wide LRU cache instead of re-invoking the model; the cache is
/// bounded, so callers must not assume an earlier result is still resident.
/// Only successful extractions are cached.
pub struct QueryGenerator<G> {
    llm: Arc<G>,
    cache: Mutex<LruCache<GenKey, String>>,
}

impl<G: StructuredGenerator> QueryGenerator<G> {
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
        pruned_schema: &GraphSchema,
        history: &[FailureAttempt],
    ) -> Result<String, GenerationError> {
        let key = GenKey {
            question: question.to_string(),
            schema_json: pruned_schema.to_json(),
            history: history.to_vec(),
        };

        if let Some(cached) = self.cache.lock().get(&key).cloned() {
            debug!(question, "query generation served from cache");
            return Ok(cached);
        }

        let prompt = prompts::query_prompt(question, &key.schema_json, history);
        let raw = self
            .llm
            .generate_structured(&prompt, OutputShape::Query)
            .await?;
        let query = parse::parse_query(&raw)?;

        debug!(question, %query, "generated query");
        self.cache.lock().put(key, query.clone());
        Ok(query)
    }
}
