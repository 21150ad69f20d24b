//! Newline-delimited JSON record log: one record per evaluated question.

use crate::dataset::CaseMetadata;
use anyhow::Context;
use graphrag_core::PipelineResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// The persisted artifact of one evaluated case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub case_id: String,
    pub question: String,
    pub gold_answer: String,
    pub model_answer: PipelineResult,
    pub metadata: CaseMetadata,
    pub judge_result: Option<bool>,
    pub judge_reasoning: Option<String>,
}

/// Append-only writer for a record log. Creates parent directories and
/// truncates any previous log at the same path.
pub struct RecordWriter {
    out: BufWriter<File>,
}

impl RecordWriter {
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
        }
        let file =
            File::create(path).with_context(|| format!("creating log {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, record: &EvaluationRecord) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Read a previously written record log.
pub fn read_records(path: impl AsRef<Path>) -> anyhow::Result<Vec<EvaluationRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening log {}", path.display()))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
