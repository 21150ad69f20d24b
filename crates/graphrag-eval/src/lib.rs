//! GraphRAG Eval: offline evaluation harness for the pipeline.
//!
//! A separate batch process consuming the core's [`PipelineResult`]s:
//!
//! 1. [`dataset`] — load a grouped evaluation file and expand one case per
//!    question.
//! 2. [`harness`] — run every case through a pipeline, judge the answer, and
//!    append one JSON record per case to a newline-delimited log.
//! 3. [`judge`] — LLM-as-judge comparison of model answer vs gold answer.
//! 4. [`report`] — score a record log into accuracy/precision aggregates, at
//!    the answer level and at the retrieved-context level.
//!
//! The harness never panics a batch on a single bad case: run-level faults
//! are logged and recorded as failed cases.

pub mod dataset;
pub mod harness;
pub mod judge;
pub mod record;
pub mod report;

pub use dataset::{load_cases, CaseMetadata, EvalCase};
pub use harness::evaluate;
pub use judge::{Judge, JudgeVerdict, LlmJudge};
pub use record::{read_records, EvaluationRecord, RecordWriter};
pub use report::{analyse, score_records, Analysis, EvalReport};
