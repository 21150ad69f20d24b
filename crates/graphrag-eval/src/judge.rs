//! LLM-as-judge answer comparison.

use async_trait::async_trait;
use graphrag_core::llm::{CompletionClient, CompletionRequest, Message, Role};
use graphrag_core::parse::strip_code_fence;
use graphrag_core::PipelineResult;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// The judge's decision for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeVerdict {
    pub matched: bool,
    pub reasoning: String,
}

/// Scores a model answer against the gold answer.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(
        &self,
        question: &str,
        gold_answer: &str,
        result: &PipelineResult,
    ) -> anyhow::Result<JudgeVerdict>;
}

pub const JUDGE_RUBRIC: &str = r#"
You are a strict evaluator. Compare the model's answer with the expected answer.
Return JSON: {"match": bool, "reasoning": str}.
Mark as match if they mean the same thing, even if phrased differently.
"#;

#[derive(Debug, Deserialize)]
struct VerdictEnvelope {
    #[serde(rename = "match")]
    matched: bool,
    reasoning: String,
}

/// Judge backed by a completion client.
///
/// One branch of the rubric is control flow rather than judgment and is
/// enforced here without a model call: an insufficient-information answer
/// against a non-empty gold answer is automatically a mismatch.
pub struct LlmJudge<C> {
    client: Arc<C>,
}

impl<C: CompletionClient> LlmJudge<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: CompletionClient> Judge for LlmJudge<C> {
    async fn judge(
        &self,
        question: &str,
        gold_answer: &str,
        result: &PipelineResult,
    ) -> anyhow::Result<JudgeVerdict> {
        if result.context.is_none() && !gold_answer.trim().is_empty() {
            debug!(question, "auto-false: no context but a gold answer exists");
            return Ok(JudgeVerdict {
                matched: false,
                reasoning: "Model reported lack of information but a gold answer exists"
                    .to_string(),
            });
        }

        let request = CompletionRequest {
            messages: vec![
                Message {
                    role: Role::System,
                    content: JUDGE_RUBRIC.to_string(),
                },
                Message {
                    role: Role::User,
                    content: format!(
                        "Question: {question}\n\nExpected answer: {gold_answer}\n\nModel answer: {}",
                        result.answer
                    ),
                },
            ],
            max_tokens: Some(1024),
            temperature: Some(0.0),
            json_mode: true,
        };

        let response = self.client.complete(request).await?;
        let envelope: VerdictEnvelope = serde_json::from_str(strip_code_fence(&response.content))?;

        Ok(JudgeVerdict {
            matched: envelope.matched,
            reasoning: envelope.reasoning,
        })
    }
}
