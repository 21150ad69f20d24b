//! Batch driver: run every case through the pipeline, judge, log, score.

use crate::dataset::EvalCase;
use crate::judge::Judge;
use crate::record::{EvaluationRecord, RecordWriter};
use crate::report::{score_records, EvalReport};
use graphrag_core::llm::StructuredGenerator;
use graphrag_core::{GraphRagPipeline, GraphStore, PipelineResult};
use tracing::{info, warn};

/// Evaluate a case list against a pipeline, appending one record per case
/// and returning the aggregate report.
///
/// Cases run sequentially; each run only shares the process-wide memoization
/// caches with its neighbours. A run-level fault (fatal pruning failure,
/// store connectivity) does not abort the batch: the case is recorded as
/// exhausted with the fault in the judge reasoning.
pub async fn evaluate<G, S, J>(
    pipeline: &GraphRagPipeline<G, S>,
    cases: &[EvalCase],
    judge: &J,
    writer: &mut RecordWriter,
) -> anyhow::Result<EvalReport>
where
    G: StructuredGenerator,
    S: GraphStore,
    J: Judge,
{
    let mut records = Vec::with_capacity(cases.len());

    for case in cases {
        let record = evaluate_case(pipeline, case, judge).await;
        info!(
            case_id = %record.case_id,
            judged = ?record.judge_result,
            "case evaluated"
        );
        writer.append(&record)?;
        records.push(record);
    }

    Ok(score_records(&records))
}

async fn evaluate_case<G, S, J>(
    pipeline: &GraphRagPipeline<G, S>,
    case: &EvalCase,
    judge: &J,
) -> EvaluationRecord
where
    G: StructuredGenerator,
    S: GraphStore,
    J: Judge,
{
    let (model_answer, run_fault) = match pipeline.run(&case.question).await {
        Ok(result) => (result, None),
        Err(e) => {
            warn!(case_id = %case.case_id, error = %e, "pipeline run failed");
            (
                PipelineResult::exhausted(case.question.clone(), None),
                Some(e.to_string()),
            )
        }
    };

    let (judge_result, judge_reasoning) = if let Some(fault) = run_fault {
        (None, Some(format!("run failed: {fault}")))
    } else {
        match judge
            .judge(&case.question, &case.gold_answer, &model_answer)
            .await
        {
            Ok(verdict) => (Some(verdict.matched), Some(verdict.reasoning)),
            Err(e) => {
                warn!(case_id = %case.case_id, error = %e, "judge call failed");
                (None, Some(format!("judge failed: {e}")))
            }
        }
    };

    EvaluationRecord {
        case_id: case.case_id.clone(),
        question: case.question.clone(),
        gold_answer: case.gold_answer.clone(),
        model_answer,
        metadata: case.metadata.clone(),
        judge_result,
        judge_reasoning,
    }
}
