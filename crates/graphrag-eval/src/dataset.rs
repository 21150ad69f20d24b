//! Evaluation dataset loading.
//!
//! The dataset file is a JSON array of question groups, each carrying a
//! shared gold answer, an optional reference query, and the gold context
//! rows. One evaluation case is expanded per question.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A group as stored on disk: several phrasings of the same question.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseGroup {
    pub questions: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub expected_query: Option<String>,
    #[serde(default)]
    pub context: Option<Vec<serde_json::Value>>,
}

/// Per-case reference material carried into the record log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub expected_query: Option<String>,
    pub gold_context: Option<Vec<serde_json::Value>>,
}

/// One evaluation case: a single question with its gold answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub case_id: String,
    pub question: String,
    pub gold_answer: String,
    pub metadata: CaseMetadata,
}

/// Expand question groups into one case per question, numbered in order.
pub fn expand_groups(groups: Vec<CaseGroup>) -> Vec<EvalCase> {
    let mut cases = Vec::new();
    for group in groups {
        for question in group.questions {
            cases.push(EvalCase {
                case_id: format!("case_{}", cases.len()),
                question,
                gold_answer: group.answer.clone(),
                metadata: CaseMetadata {
                    expected_query: group.expected_query.clone(),
                    gold_context: group.context.clone(),
                },
            });
        }
    }
    cases
}

/// Load and expand an evaluation dataset file.
pub fn load_cases(path: impl AsRef<Path>) -> anyhow::Result<Vec<EvalCase>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    let groups: Vec<CaseGroup> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing dataset {}", path.display()))?;
    Ok(expand_groups(groups))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(questions: &[&str], answer: &str) -> CaseGroup {
        CaseGroup {
            questions: questions.iter().map(|q| q.to_string()).collect(),
            answer: answer.to_string(),
            expected_query: Some("MATCH (n) RETURN n".to_string()),
            context: Some(vec![serde_json::json!({"n": 1})]),
        }
    }

    #[test]
    fn expansion_produces_one_case_per_question() {
        let cases = expand_groups(vec![
            group(&["Who won?", "Which scholar won?"], "Marie Curie"),
            group(&["How many?"], "Two"),
        ]);

        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].case_id, "case_0");
        assert_eq!(cases[2].case_id, "case_2");
        assert_eq!(cases[1].question, "Which scholar won?");
        assert_eq!(cases[1].gold_answer, "Marie Curie");
        assert_eq!(cases[2].gold_answer, "Two");
    }

    #[test]
    fn missing_reference_fields_default_to_none() {
        let groups: Vec<CaseGroup> =
            serde_json::from_str(r#"[{"questions": ["Who?"], "answer": "Her"}]"#).unwrap();
        let cases = expand_groups(groups);
        assert!(cases[0].metadata.expected_query.is_none());
        assert!(cases[0].metadata.gold_context.is_none());
    }
}
