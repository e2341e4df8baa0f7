use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::{error::AppError, session::ExamArea};

/// Delimiter line between transcript blocks.
const BLOCK_DELIMITER: &str = "========================================";

/// One evaluation event as recorded in the transcript.
#[derive(Clone, Debug)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Utc>,
    pub area: ExamArea,
    pub question: String,
    pub answer: String,
    pub evaluation: String,
}

impl TranscriptEntry {
    pub fn new(area: ExamArea, question: &str, answer: &str, evaluation: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            area,
            question: question.to_string(),
            answer: answer.to_string(),
            evaluation: evaluation.to_string(),
        }
    }
}

/// Append-only plain-text log of evaluation events.
///
/// Blocks are delimited text, in append order, with no rotation or size
/// bound. Nothing reads this file programmatically; it exists so a run
/// of the simulator leaves an auditable record.
#[derive(Clone, Debug)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &TranscriptEntry) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let block = format!(
            "{BLOCK_DELIMITER}\n\
             timestamp: {}\n\
             area: {}\n\
             question:\n{}\n\
             answer:\n{}\n\
             evaluation:\n{}\n",
            entry.timestamp.to_rfc3339(),
            entry.area,
            entry.question,
            entry.answer,
            entry.evaluation,
        );

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
