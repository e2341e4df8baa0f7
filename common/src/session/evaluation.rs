use serde::{Deserialize, Serialize};

/// Section label the evaluation prompt asks the model to emit first.
const GRADE_LABEL: &str = "grade:";
/// Section label for the critical analysis block.
const ANALYSIS_LABEL: &str = "analysis:";
/// Section label for the model answer block.
const MODEL_ANSWER_LABEL: &str = "model answer:";

/// Declared grading scale for the exam, inclusive on both ends.
pub const GRADE_MIN: f64 = 1.0;
pub const GRADE_MAX: f64 = 7.0;

/// A graded answer as returned by the completion service.
///
/// The service is instructed to emit a labeled three-part response
/// (grade, critical analysis, model answer) but nothing enforces that
/// on the wire, so each field is parsed best-effort and the raw text is
/// always retained for display.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub grade: Option<f64>,
    pub analysis: Option<String>,
    pub model_answer: Option<String>,
    pub raw: String,
}

impl Evaluation {
    /// Parses the labeled response format, falling back to a raw-only
    /// result when the labels are absent or malformed.
    pub fn parse(response: &str) -> Self {
        let mut grade = None;
        let mut analysis_lines: Vec<&str> = Vec::new();
        let mut model_answer_lines: Vec<&str> = Vec::new();
        let mut current: Option<Section> = None;

        for line in response.lines() {
            let trimmed = line.trim();
            let lowered = trimmed.to_ascii_lowercase();

            if let Some(rest) = labeled_rest(trimmed, &lowered, GRADE_LABEL) {
                grade = parse_grade(rest);
                current = None;
            } else if let Some(rest) = labeled_rest(trimmed, &lowered, ANALYSIS_LABEL) {
                if !rest.is_empty() {
                    analysis_lines.push(rest);
                }
                current = Some(Section::Analysis);
            } else if let Some(rest) = labeled_rest(trimmed, &lowered, MODEL_ANSWER_LABEL) {
                if !rest.is_empty() {
                    model_answer_lines.push(rest);
                }
                current = Some(Section::ModelAnswer);
            } else {
                match current {
                    Some(Section::Analysis) => analysis_lines.push(line),
                    Some(Section::ModelAnswer) => model_answer_lines.push(line),
                    None => {}
                }
            }
        }

        Self {
            grade,
            analysis: join_section(analysis_lines),
            model_answer: join_section(model_answer_lines),
            raw: response.to_string(),
        }
    }

    /// True when none of the labeled sections could be recovered.
    pub fn is_raw_fallback(&self) -> bool {
        self.grade.is_none() && self.analysis.is_none() && self.model_answer.is_none()
    }
}

/// Sections of the labeled response that span multiple lines.
enum Section {
    Analysis,
    ModelAnswer,
}

/// Returns the text after `label` when the line starts with it,
/// ignoring case and leading Markdown emphasis.
fn labeled_rest<'a>(line: &'a str, lowered: &str, label: &str) -> Option<&'a str> {
    let prefix_len = lowered
        .trim_start_matches(['*', '#', ' '])
        .starts_with(label)
        .then(|| {
            let skipped = lowered.len() - lowered.trim_start_matches(['*', '#', ' ']).len();
            skipped + label.len()
        })?;
    line.get(prefix_len..)
        .map(|rest| rest.trim_start_matches(['*', ' ']).trim_end())
}

/// Extracts the leading numeric token and validates the declared range.
fn parse_grade(rest: &str) -> Option<f64> {
    let token = rest
        .split_whitespace()
        .next()?
        .split('/')
        .next()?
        .trim_end_matches(['.', ','])
        .replace(',', ".");
    let value: f64 = token.parse().ok()?;
    (GRADE_MIN..=GRADE_MAX).contains(&value).then_some(value)
}

fn join_section(lines: Vec<&str>) -> Option<String> {
    let joined = lines.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}
