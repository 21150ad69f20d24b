//! End-to-end tests of the retry orchestrator against scripted model and
//! store doubles. No real language model or database anywhere.

use async_trait::async_trait;
use graphrag_core::llm::{LLMError, OutputShape, StructuredGenerator};
use graphrag_core::{
    GraphRagPipeline, GraphSchema, GraphStore, Node, PipelineConfig, PipelineError, Property,
    Row, StoreError, INSUFFICIENT_INFORMATION, NO_QUERY_SENTINEL, NO_VALID_QUERY,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test doubles
// ============================================================================

/// Scripted language model: a fixed pruning artifact, a queue of query
/// artifacts popped per generation call, and a fixed answer artifact. Every
/// query prompt is recorded so tests can inspect the history that was fed in.
struct ScriptedLlm {
    prune_output: String,
    query_outputs: Mutex<VecDeque<String>>,
    answer_output: String,
    query_prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(queries: &[&str]) -> Self {
        Self {
            prune_output: r#"{"nodes":[{"label":"Scholar","properties":["knownName"]}],"edges":[]}"#
                .to_string(),
            query_outputs: Mutex::new(queries.iter().map(|q| q.to_string()).collect()),
            answer_output: r#"{"response": "Marie Curie won twice."}"#.to_string(),
            query_prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_query_prompt(&self) -> String {
        self.query_prompts.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedLlm {
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: OutputShape,
    ) -> Result<String, LLMError> {
        match shape {
            OutputShape::PrunedSchema => Ok(self.prune_output.clone()),
            OutputShape::Query => {
                self.query_prompts.lock().push(prompt.to_string());
                self.query_outputs
                    .lock()
                    .pop_front()
                    .ok_or_else(|| LLMError::Api("script exhausted".to_string()))
            }
            OutputShape::Answer => Ok(self.answer_output.clone()),
        }
    }
}

/// Scripted graph store: explain and execute results are popped per call.
struct ScriptedStore {
    explain_results: Mutex<VecDeque<Result<(), StoreError>>>,
    execute_results: Mutex<VecDeque<Result<Vec<Row>, StoreError>>>,
}

impl ScriptedStore {
    fn new(
        explain: Vec<Result<(), StoreError>>,
        execute: Vec<Result<Vec<Row>, StoreError>>,
    ) -> Self {
        Self {
            explain_results: Mutex::new(explain.into()),
            execute_results: Mutex::new(execute.into()),
        }
    }
}

#[async_trait]
impl GraphStore for ScriptedStore {
    async fn get_schema(&self) -> Result<GraphSchema, StoreError> {
        Ok(GraphSchema {
            nodes: vec![Node {
                label: "Scholar".into(),
                properties: Some(vec![Property::new("knownName", "string")]),
            }],
            edges: vec![],
        })
    }

    async fn explain(&self, _query: &str) -> Result<(), StoreError> {
        self.explain_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::Connection("explain script exhausted".into())))
    }

    async fn execute(&self, _query: &str) -> Result<Vec<Row>, StoreError> {
        self.execute_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::Connection("execute script exhausted".into())))
    }
}

fn row(column: &str, value: serde_json::Value) -> Row {
    let mut r = Row::new();
    r.insert(column.to_string(), value);
    r
}

fn config(max_retries: u32) -> PipelineConfig {
    PipelineConfig {
        max_retries,
        success_cooldown: Duration::ZERO,
    }
}

fn query_envelope(query: &str) -> String {
    format!(r#"{{"query": "{query}"}}"#)
}

fn count_recorded_attempts(prompt: &str) -> usize {
    prompt.matches("Generated Query:").count()
}

// ============================================================================
// Scenarios
// ============================================================================

/// Scenario A: validation fails on attempts 1-2 with distinct messages, the
/// third query validates and executes non-empty. Context comes from attempt
/// 3, whose prompt carried both prior failures.
#[tokio::test]
async fn validation_failures_feed_history_until_success() {
    let llm = Arc::new(ScriptedLlm::new(&[
        &query_envelope("MATCH one"),
        &query_envelope("MATCH two"),
        &query_envelope("MATCH (s:Scholar) RETURN s.knownName"),
    ]));
    let rows = vec![row("s.knownName", serde_json::json!("Marie Curie"))];
    let store = Arc::new(ScriptedStore::new(
        vec![
            Err(StoreError::InvalidQuery("unknown token `one`".into())),
            Err(StoreError::InvalidQuery("unknown token `two`".into())),
            Ok(()),
        ],
        vec![Ok(rows.clone())],
    ));

    let pipeline = GraphRagPipeline::new(Arc::clone(&llm), store, config(3));
    let result = pipeline.run("Who won twice?").await.unwrap();

    assert_eq!(result.context, Some(rows));
    assert_eq!(result.query, "MATCH (s:Scholar) RETURN s.knownName");
    assert_eq!(result.answer, "Marie Curie won twice.");

    let final_prompt = llm.last_query_prompt();
    assert_eq!(count_recorded_attempts(&final_prompt), 2);
    assert!(final_prompt.contains("unknown token `one`"));
    assert!(final_prompt.contains("unknown token `two`"));
}

/// Scenario B: one attempt, empty result set. Immediate exhaustion with the
/// fixed insufficient-information answer and no context.
#[tokio::test]
async fn empty_result_with_single_attempt_exhausts() {
    let llm = Arc::new(ScriptedLlm::new(&[&query_envelope(
        "MATCH (s:Scholar) RETURN s.knownName",
    )]));
    let store = Arc::new(ScriptedStore::new(vec![Ok(())], vec![Ok(vec![])]));

    let pipeline = GraphRagPipeline::new(llm, store, config(1));
    let result = pipeline.run("Who won in 3000?").await.unwrap();

    assert_eq!(result.answer, INSUFFICIENT_INFORMATION);
    assert!(result.context.is_none());
    assert_eq!(result.query, "MATCH (s:Scholar) RETURN s.knownName");
}

/// Scenario C: a connectivity fault on explain is not a correctable
/// generation mistake; it propagates instead of being recorded.
#[tokio::test]
async fn connectivity_fault_on_explain_propagates() {
    let llm = Arc::new(ScriptedLlm::new(&[&query_envelope("MATCH (n) RETURN n")]));
    let store = Arc::new(ScriptedStore::new(
        vec![Err(StoreError::Connection("socket closed".into()))],
        vec![],
    ));

    let pipeline = GraphRagPipeline::new(llm, store, config(3));
    let err = pipeline.run("Who?").await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Store(StoreError::Connection(_))
    ));
}

#[tokio::test]
async fn connectivity_fault_on_execute_propagates() {
    let llm = Arc::new(ScriptedLlm::new(&[&query_envelope("MATCH (n) RETURN n")]));
    let store = Arc::new(ScriptedStore::new(
        vec![Ok(())],
        vec![Err(StoreError::Connection("socket closed".into()))],
    ));

    let pipeline = GraphRagPipeline::new(llm, store, config(3));
    let err = pipeline.run("Who?").await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Store(StoreError::Connection(_))
    ));
}

/// Every attempt fails validation: the final generation call saw
/// `max_retries - 1` failures, and the terminal result reports the last
/// attempted query.
#[tokio::test]
async fn exhausting_validation_reports_last_query_and_full_history() {
    let llm = Arc::new(ScriptedLlm::new(&[
        &query_envelope("MATCH one"),
        &query_envelope("MATCH two"),
        &query_envelope("MATCH three"),
    ]));
    let store = Arc::new(ScriptedStore::new(
        vec![
            Err(StoreError::InvalidQuery("bad one".into())),
            Err(StoreError::InvalidQuery("bad two".into())),
            Err(StoreError::InvalidQuery("bad three".into())),
        ],
        vec![],
    ));

    let pipeline = GraphRagPipeline::new(Arc::clone(&llm), store, config(3));
    let result = pipeline.run("Who?").await.unwrap();

    assert!(result.context.is_none());
    assert_eq!(result.answer, INSUFFICIENT_INFORMATION);
    assert_eq!(result.query, "MATCH three");
    assert_eq!(count_recorded_attempts(&llm.last_query_prompt()), 2);
}

/// A store fault during execute is classified as an execution failure and
/// fed back into the next generation attempt.
#[tokio::test]
async fn execution_fault_is_recorded_and_retried() {
    let llm = Arc::new(ScriptedLlm::new(&[
        &query_envelope("MATCH slow"),
        &query_envelope("MATCH fast"),
    ]));
    let rows = vec![row("n", serde_json::json!(7))];
    let store = Arc::new(ScriptedStore::new(
        vec![Ok(()), Ok(())],
        vec![
            Err(StoreError::Execution("timeout after 30s".into())),
            Ok(rows.clone()),
        ],
    ));

    let pipeline = GraphRagPipeline::new(Arc::clone(&llm), store, config(2));
    let result = pipeline.run("How many?").await.unwrap();

    assert_eq!(result.context, Some(rows));
    let final_prompt = llm.last_query_prompt();
    assert!(final_prompt.contains("Execution Error:"));
    assert!(final_prompt.contains("timeout after 30s"));
}

/// An unparseable query artifact consumes one attempt, recorded with the
/// no-query sentinel, and the run recovers on the next attempt.
#[tokio::test]
async fn generation_parse_failure_consumes_an_attempt() {
    let llm = Arc::new(ScriptedLlm::new(&[
        "this is not a query envelope",
        &query_envelope("MATCH (n) RETURN n"),
    ]));
    let rows = vec![row("n", serde_json::json!(1))];
    let store = Arc::new(ScriptedStore::new(vec![Ok(())], vec![Ok(rows.clone())]));

    let pipeline = GraphRagPipeline::new(Arc::clone(&llm), store, config(2));
    let result = pipeline.run("How many?").await.unwrap();

    assert_eq!(result.context, Some(rows));
    let final_prompt = llm.last_query_prompt();
    assert!(final_prompt.contains(NO_QUERY_SENTINEL));
    assert!(final_prompt.contains("Generation Error:"));
}

/// When no attempt ever yields a query, the exhausted result falls back to
/// the no-valid-query sentinel.
#[tokio::test]
async fn exhaustion_without_any_query_uses_sentinel() {
    let llm = Arc::new(ScriptedLlm::new(&["garbage", "more garbage"]));
    let store = Arc::new(ScriptedStore::new(vec![], vec![]));

    let pipeline = GraphRagPipeline::new(llm, store, config(2));
    let result = pipeline.run("Who?").await.unwrap();

    assert_eq!(result.query, NO_VALID_QUERY);
    assert_eq!(result.answer, INSUFFICIENT_INFORMATION);
    assert!(result.context.is_none());
}

/// A max_retries below the contract minimum still yields exactly one
/// attempt and one terminal result.
#[tokio::test]
async fn zero_max_retries_is_clamped_to_one_attempt() {
    let llm = Arc::new(ScriptedLlm::new(&[&query_envelope("MATCH (n) RETURN n")]));
    let rows = vec![row("n", serde_json::json!(1))];
    let store = Arc::new(ScriptedStore::new(vec![Ok(())], vec![Ok(rows.clone())]));

    let pipeline = GraphRagPipeline::new(llm, store, config(0));
    let result = pipeline.run("How many?").await.unwrap();

    assert_eq!(result.context, Some(rows));
}
