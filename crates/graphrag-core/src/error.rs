//! Error taxonomy for the pipeline.
//!
//! Only two classes of fault escape a run: an unparseable pruned schema and
//! store connectivity faults (plus language-model faults outside the retry
//! loop). Everything that happens *inside* an attempt is caught, classified
//! into a [`crate::FailureAttempt`], and drives the next retry.

use crate::llm::LLMError;
use crate::parse::ParseError;
use crate::store::StoreError;
use thiserror::Error;

/// Failure of one generation call: either the model call itself failed or
/// its artifact could not be parsed. Inside the retry loop both consume one
/// attempt; outside it (answer generation) they propagate.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("language model call failed: {0}")]
    Llm(#[from] LLMError),
    #[error("generated artifact was not parseable: {0}")]
    Parse(#[from] ParseError),
}

/// A run-level fault. Per-attempt failures never surface here; they are
/// recorded in the failure history instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pruner's artifact was unparseable. Fatal: no retry budget is
    /// spent on pruning.
    #[error("schema pruning returned an unparseable artifact: {0}")]
    SchemaParse(#[source] ParseError),

    /// Answer generation failed after a successful execute. Not retried.
    #[error("answer generation failed: {0}")]
    Answer(#[source] GenerationError),

    /// Store fault outside the validate/execute contract (connectivity).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Language model fault outside the retry loop (pruning).
    #[error(transparent)]
    Llm(#[from] LLMError),
}
