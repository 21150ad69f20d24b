//! Aggregate scoring of a record log.
//!
//! Two views of the same log:
//! - **answer-level**: a case counts as attempted when the pipeline returned
//!   context AND the judge produced a verdict; a missing verdict counts as
//!   no attempt, not as a miss.
//! - **context-level**: the retrieved rows are checked against the gold
//!   context by loose (case-insensitive substring) containment, catching
//!   runs where the judge liked the wording but the retrieval was wrong.

use crate::record::EvaluationRecord;
use serde::Serialize;

/// Counts and ratios over tri-state outcomes (`Some(true)` / `Some(false)` /
/// `None` = no attempt).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub true_count: usize,
    pub false_count: usize,
    pub no_attempt: usize,
    /// true / (true + false + no_attempt)
    pub accuracy: f64,
    /// true / (true + false)
    pub precision: f64,
}

/// Aggregate tri-state outcomes with zero-division guards.
pub fn analyse(outcomes: &[Option<bool>]) -> Analysis {
    let true_count = outcomes.iter().filter(|o| **o == Some(true)).count();
    let false_count = outcomes.iter().filter(|o| **o == Some(false)).count();
    let no_attempt = outcomes.iter().filter(|o| o.is_none()).count();

    let attempted = true_count + false_count;
    let precision = if attempted > 0 {
        true_count as f64 / attempted as f64
    } else {
        0.0
    };
    let accuracy = if outcomes.is_empty() {
        0.0
    } else {
        true_count as f64 / outcomes.len() as f64
    };

    Analysis {
        true_count,
        false_count,
        no_attempt,
        accuracy,
        precision,
    }
}

/// Loose textual match: lowercase substring containment in either direction.
fn loose_match(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    let a = render(a).to_lowercase();
    let b = render(b).to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether the retrieved context covers every gold context item.
pub fn context_covers_gold(
    context: Option<&[graphrag_core::Row]>,
    gold: Option<&[serde_json::Value]>,
) -> bool {
    let Some(context) = context.filter(|rows| !rows.is_empty()) else {
        return false;
    };
    let rendered: Vec<serde_json::Value> = context
        .iter()
        .map(|row| serde_json::to_value(row).unwrap_or_default())
        .collect();

    let Some(gold) = gold.filter(|items| !items.is_empty()) else {
        // Retrieved rows with nothing to check them against counts as a miss.
        return false;
    };

    gold.iter()
        .all(|item| rendered.iter().any(|row| loose_match(item, row)))
}

/// The two aggregate views over one record log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub query_analysis: Analysis,
    pub answer_analysis: Analysis,
}

/// Score a full record log.
pub fn score_records(records: &[EvaluationRecord]) -> EvalReport {
    let answer_outcomes: Vec<Option<bool>> = records
        .iter()
        .map(|r| {
            if r.model_answer.context.is_some() {
                r.judge_result
            } else {
                None
            }
        })
        .collect();

    let query_outcomes: Vec<Option<bool>> = records
        .iter()
        .map(|r| {
            Some(context_covers_gold(
                r.model_answer.context.as_deref(),
                r.metadata.gold_context.as_deref(),
            ))
        })
        .collect();

    EvalReport {
        query_analysis: analyse(&query_outcomes),
        answer_analysis: analyse(&answer_outcomes),
    }
}
