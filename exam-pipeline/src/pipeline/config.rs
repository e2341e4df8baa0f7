use crate::reducer::ReductionTuning;

/// Pipeline-wide configuration: reduction policy plus the output
/// budgets for the two examiner calls.
#[derive(Clone, Debug)]
pub struct ExamConfig {
    pub tuning: ReductionTuning,
    /// Output cap for a generated exam question.
    pub question_max_chars: usize,
    /// Output cap for a full evaluation (grade, analysis, model answer).
    pub evaluation_max_chars: usize,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            tuning: ReductionTuning::default(),
            question_max_chars: 1_000,
            evaluation_max_chars: 4_000,
        }
    }
}
