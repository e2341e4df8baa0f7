pub mod evaluation;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use evaluation::Evaluation;

/// The closed set of exam subject areas the simulator supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamArea {
    ConstitutionalLaw,
    CivilLaw,
    CivilProceduralLaw,
}

impl ExamArea {
    /// Human-readable label embedded into prompts and the transcript.
    pub fn label(self) -> &'static str {
        match self {
            Self::ConstitutionalLaw => "Constitutional Law",
            Self::CivilLaw => "Civil Law",
            Self::CivilProceduralLaw => "Civil Procedural Law",
        }
    }
}

impl std::fmt::Display for ExamArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A document handed to the pipeline: the original file name (used for
/// extension dispatch) and wherever its bytes currently live on disk.
#[derive(Clone, Debug)]
pub struct UploadedDocument {
    pub name: String,
    pub path: PathBuf,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Per-exam state carried across user actions.
///
/// Created when notes are processed; re-processing builds a fresh session
/// (the corpus is replaced, never merged). The last generated question and
/// evaluation survive until overwritten or the session is dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExamSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub corpus: String,
    pub question: Option<String>,
    pub last_evaluation: Option<Evaluation>,
}

impl ExamSession {
    pub fn new(corpus: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            corpus,
            question: None,
            last_evaluation: None,
        }
    }

    /// Overwrites any previously generated question.
    pub fn set_question(&mut self, question: String) {
        self.question = Some(question);
    }

    pub fn record_evaluation(&mut self, evaluation: Evaluation) {
        self.last_evaluation = Some(evaluation);
    }
}
