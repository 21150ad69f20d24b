//! Graph store seam.
//!
//! The pipeline never talks to a concrete database; it requires three
//! operations from whatever implements [`GraphStore`]: schema introspection,
//! a non-executing explain-style check, and execution. The error type
//! separates query-level faults (correctable by regeneration) from
//! connectivity faults (not correctable, propagated to the caller).

use crate::{GraphSchema, Row};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The query was rejected as malformed (explain/plan failure).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// The store raised while executing a well-formed query.
    #[error("query execution failed: {0}")]
    Execution(String),
    /// The store itself is unreachable or misbehaving. Never recorded as an
    /// attempt failure.
    #[error("store connection failed: {0}")]
    Connection(String),
}

impl StoreError {
    /// Whether this fault is attributable to the query rather than the
    /// store, i.e. worth feeding back into regeneration.
    pub fn is_query_fault(&self) -> bool {
        matches!(self, StoreError::InvalidQuery(_) | StoreError::Execution(_))
    }
}

/// External graph database operations required by the pipeline.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Full schema introspection.
    async fn get_schema(&self) -> Result<GraphSchema, StoreError>;

    /// Validation-only query-plan check. Succeeds for well-formed queries,
    /// fails with [`StoreError::InvalidQuery`] otherwise. Must not
    /// materialize results or mutate state.
    async fn explain(&self, query: &str) -> Result<(), StoreError>;

    /// Execute a query, returning rows in store order.
    async fn execute(&self, query: &str) -> Result<Vec<Row>, StoreError>;
}

/// Outcome of the static validation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { message: String },
}

/// Statically validate a candidate query via the store's explain operation.
///
/// Query invalidity is communicated through [`Validation::Invalid`], never
/// as an error. A connectivity fault is not a correctable generation mistake
/// and propagates instead.
pub async fn validate(store: &dyn GraphStore, query: &str) -> Result<Validation, StoreError> {
    match store.explain(query).await {
        Ok(()) => Ok(Validation::Valid),
        Err(e) if e.is_query_fault() => {
            tracing::debug!(error = %e, "query failed validation");
            Ok(Validation::Invalid {
                message: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}
