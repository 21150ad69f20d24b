//! Retry orchestrator: the state machine binding pruner, generator,
//! validator, execution and answerer together.
//!
//! One run is strictly sequential: each stage's output gates the next.
//! `Pruning → Generating → Validating → Executing → Answering`, with every
//! per-attempt failure classified into an [`AttemptOutcome`], recorded in the
//! failure history, and fed to the next generation attempt. The loop is
//! bounded by `max_retries`; exhaustion is a defined terminal state, not an
//! error.

use crate::answer::AnswerGenerator;
use crate::error::PipelineError;
use crate::generate::QueryGenerator;
use crate::llm::StructuredGenerator;
use crate::prune::SchemaPruner;
use crate::store::{self, GraphStore, Validation};
use crate::{FailureAttempt, GraphSchema, PipelineResult, Row, NO_QUERY_SENTINEL};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Advisory message recorded when a query executed but matched nothing.
pub const EMPTY_RESULT_ADVISORY: &str = "Query executed successfully but returned no results. \
     The query may need to be adjusted to find matching data in the graph.";

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Total attempts across generate/validate/execute. Values below 1 are
    /// treated as 1.
    pub max_retries: u32,
    /// Pause after a successful run, a courtesy throttle for rate-limited
    /// model APIs. Not part of the correctness contract.
    pub success_cooldown: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            success_cooldown: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Typed outcome of a single attempt. Makes the transition table testable
/// without any language model in the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Executed with a non-empty result set; the loop stops here.
    Success { query: String, rows: Vec<Row> },
    /// The generation call failed or its artifact was unparseable.
    GenerationFailed { error: String },
    /// The static explain-style check rejected the query.
    ValidationFailed { query: String, message: String },
    /// The store raised while executing the query.
    ExecutionFailed { query: String, message: String },
    /// Executed cleanly but matched nothing. Not a fault, still retried.
    EmptyResult { query: String },
}

impl AttemptOutcome {
    /// The query this attempt put forward, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            AttemptOutcome::Success { query, .. }
            | AttemptOutcome::ValidationFailed { query, .. }
            | AttemptOutcome::ExecutionFailed { query, .. }
            | AttemptOutcome::EmptyResult { query } => Some(query),
            AttemptOutcome::GenerationFailed { .. } => None,
        }
    }

    /// The failure record appended to history, or `None` for success.
    pub fn into_failure(self) -> Option<FailureAttempt> {
        match self {
            AttemptOutcome::Success { .. } => None,
            AttemptOutcome::GenerationFailed { error } => Some(FailureAttempt {
                query: NO_QUERY_SENTINEL.to_string(),
                error: format!("Generation Error: {error}"),
            }),
            AttemptOutcome::ValidationFailed { query, message } => Some(FailureAttempt {
                query,
                error: format!("Validation Error: {message}"),
            }),
            AttemptOutcome::ExecutionFailed { query, message } => Some(FailureAttempt {
                query,
                error: format!("Execution Error: {message}"),
            }),
            AttemptOutcome::EmptyResult { query } => Some(FailureAttempt {
                query,
                error: EMPTY_RESULT_ADVISORY.to_string(),
            }),
        }
    }
}

/// The full question-to-answer pipeline over a language model `G` and a
/// graph store `S`.
pub struct GraphRagPipeline<G, S> {
    pruner: SchemaPruner<G>,
    generator: QueryGenerator<G>,
    answerer: AnswerGenerator<G>,
    store: Arc<S>,
    config: PipelineConfig,
}

impl<G, S> GraphRagPipeline<G, S>
where
    G: StructuredGenerator,
    S: GraphStore,
{
    pub fn new(llm: Arc<G>, store: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            pruner: SchemaPruner::new(Arc::clone(&llm)),
            generator: QueryGenerator::new(Arc::clone(&llm)),
            answerer: AnswerGenerator::new(llm),
            store,
            config,
        }
    }

    /// Run the full pipeline for one question, producing exactly one
    /// terminal result.
    ///
    /// Errors escape only for the fatal paths: an unparseable pruned schema,
    /// store connectivity faults, and faults in the pruning or answering
    /// calls themselves. Every per-attempt failure is recorded and retried
    /// until the budget is spent.
    pub async fn run(&self, question: &str) -> Result<PipelineResult, PipelineError> {
        info!(question, "running pipeline");

        let full_schema = self.store.get_schema().await?;
        let pruned = self.pruner.prune(question, &full_schema).await?;

        let max_retries = self.config.max_retries.max(1);
        let mut history: Vec<FailureAttempt> = Vec::new();
        let mut last_query: Option<String> = None;

        for attempt in 1..=max_retries {
            debug!(attempt, max_retries, failures = history.len(), "generating query");

            let outcome = self.attempt(question, &pruned, &history).await?;
            if let Some(query) = outcome.query() {
                last_query = Some(query.to_string());
            }

            match outcome {
                AttemptOutcome::Success { query, rows } => {
                    info!(attempt, rows = rows.len(), "query succeeded");
                    return self.answer(question, query, rows).await;
                }
                failed => {
                    let record = failed.into_failure().expect("non-success maps to a failure");
                    warn!(attempt, error = %record.error, "attempt failed");
                    history.push(record);
                }
            }
        }

        info!(max_retries, "all attempts failed or returned empty results");
        Ok(PipelineResult::exhausted(question, last_query))
    }

    /// One pass through Generating → Validating → Executing. Returns `Err`
    /// only for store faults outside the validate/execute contract.
    async fn attempt(
        &self,
        question: &str,
        pruned: &GraphSchema,
        history: &[FailureAttempt],
    ) -> Result<AttemptOutcome, PipelineError> {
        let query = match self.generator.generate(question, pruned, history).await {
            Ok(query) => query,
            Err(e) => {
                return Ok(AttemptOutcome::GenerationFailed {
                    error: e.to_string(),
                })
            }
        };

        match store::validate(self.store.as_ref(), &query).await? {
            Validation::Valid => {}
            Validation::Invalid { message } => {
                return Ok(AttemptOutcome::ValidationFailed { query, message })
            }
        }

        match self.store.execute(&query).await {
            Ok(rows) if rows.is_empty() => Ok(AttemptOutcome::EmptyResult { query }),
            Ok(rows) => Ok(AttemptOutcome::Success { query, rows }),
            Err(e) if e.is_query_fault() => Ok(AttemptOutcome::ExecutionFailed {
                query,
                message: e.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn answer(
        &self,
        question: &str,
        query: String,
        rows: Vec<Row>,
    ) -> Result<PipelineResult, PipelineError> {
        let context = serde_json::to_string(&rows).unwrap_or_default();
        let answer = self
            .answerer
            .generate(question, &query, &context)
            .await
            .map_err(PipelineError::Answer)?;

        if !self.config.success_cooldown.is_zero() {
            tokio::time::sleep(self.config.success_cooldown).await;
        }

        Ok(PipelineResult {
            question: question.to_string(),
            query,
            answer,
            context: Some(rows),
        })
    }
}
