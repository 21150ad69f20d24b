//! GraphRAG Core: Natural Language → Graph Query → Grounded Answer
//!
//! This crate turns a free-text question into a query against a labelled
//! property graph, executes it, and summarizes the rows into a natural
//! language answer. Query generation by a language model is unreliable, so
//! the pipeline validates every candidate query and feeds structured failure
//! history back into regeneration.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      RETRY-AND-REPAIR PIPELINE                   │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  question ──► [Pruner] ──► pruned schema                         │
//! │                                │                                 │
//! │            failure history     ▼                                 │
//! │          ┌──────────────► [Generator] ──► candidate query        │
//! │          │                                   │                   │
//! │          │                                   ▼                   │
//! │          │                              [Validator]              │
//! │          │        invalid ◄──────────────┤                       │
//! │          ├────────────────┘              │ valid                 │
//! │          │                               ▼                       │
//! │          │        empty / error      [Execute]                   │
//! │          └────────────────◄──────────────┤                       │
//! │                                          │ rows                  │
//! │                                          ▼                       │
//! │                                  [Answer Generator]              │
//! │                                          │                       │
//! │                                          ▼                       │
//! │                                   PipelineResult                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The language model and the graph store are trait seams
//! ([`llm::CompletionClient`] / [`llm::StructuredGenerator`] and
//! [`store::GraphStore`]); the orchestration, failure classification,
//! bounded retries and memoization live here.

pub mod answer;
pub mod error;
pub mod generate;
pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod prune;
pub mod store;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Types
// ============================================================================

/// A single row returned by query execution: column name → value, in the
/// order the store produced the columns.
pub type Row = IndexMap<String, serde_json::Value>;

/// A property of a node or edge. `type` is a free-form tag ("string",
/// "int", ...), not a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl Property {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }
}

/// A node type in the property graph schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
}

/// A relationship type. `from` and `to` name source and target node labels.
/// Referential integrity against the node set is deliberately not enforced
/// here; [`GraphSchema::dangling_edge_refs`] reports violations for callers
/// that care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub label: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
}

/// A labelled property graph schema: either the store's full schema or a
/// question-pruned subset. Immutable within one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSchema {
    /// Serialized form used in prompts and memoization keys.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("schema serializes to JSON")
    }

    /// Labels referenced by an edge's `from`/`to` that do not exist among the
    /// schema's nodes. Advisory only.
    pub fn dangling_edge_refs(&self) -> Vec<String> {
        let known: std::collections::HashSet<&str> =
            self.nodes.iter().map(|n| n.label.as_str()).collect();
        let mut missing = Vec::new();
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !known.contains(endpoint.as_str()) && !missing.contains(endpoint) {
                    missing.push(endpoint.clone());
                }
            }
        }
        missing
    }
}

/// A candidate query produced by the generator. The downstream query engine
/// consumes queries on a single wire line, so `query` never contains
/// embedded newlines (the parser collapses them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub query: String,
}

/// One failed attempt inside a question's retry loop. Ephemeral: accumulated
/// in order for the duration of the loop, never persisted beyond it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureAttempt {
    pub query: String,
    pub error: String,
}

/// Query recorded in a [`FailureAttempt`] when no query was extracted.
pub const NO_QUERY_SENTINEL: &str = "no query generated";

/// Query recorded in an exhausted [`PipelineResult`] when no attempt ever
/// produced a query.
pub const NO_VALID_QUERY: &str = "Failed to generate valid query";

/// Answer returned when every attempt failed or came back empty.
pub const INSUFFICIENT_INFORMATION: &str =
    "I don't have enough information to answer this question.";

/// Terminal output of one pipeline run. `context: None` signals total
/// failure (all retries exhausted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub question: String,
    pub query: String,
    pub answer: String,
    pub context: Option<Vec<Row>>,
}

impl PipelineResult {
    /// The fixed result for a run that exhausted its retry budget.
    pub fn exhausted(question: impl Into<String>, last_query: Option<String>) -> Self {
        Self {
            question: question.into(),
            query: last_query.unwrap_or_else(|| NO_VALID_QUERY.to_string()),
            answer: INSUFFICIENT_INFORMATION.to_string(),
            context: None,
        }
    }
}

// ============================================================================
// Re-exports
// ============================================================================

pub use answer::AnswerGenerator;
pub use error::{GenerationError, PipelineError};
pub use generate::QueryGenerator;
pub use llm::{CompletionClient, OutputShape, StructuredGenerator};
pub use parse::ParseError;
pub use pipeline::{AttemptOutcome, GraphRagPipeline, PipelineConfig};
pub use prune::SchemaPruner;
pub use store::{GraphStore, StoreError, Validation};
