//! Instruction templates for every completion request the pipeline makes.
//!
//! The only guard against the model inventing material is the wording of
//! these prompts; nothing is enforced programmatically, so each template
//! repeats the source-only constraint explicitly.

use common::session::ExamArea;

/// System-role framing shared by the summarization calls.
pub static SUMMARY_SYSTEM_MESSAGE: &str = "You are a careful legal study assistant. \
    You only restate material that is present in the text you are given. \
    You never add doctrine, case law, article numbers, or examples of your own.";

/// System-role framing for the examiner persona.
pub static EXAMINER_SYSTEM_MESSAGE: &str = "You are a law school examination board member \
    conducting a final degree exam. You work strictly from the student's study notes \
    supplied to you and never introduce outside doctrine or legal citations.";

/// Prompt for one chunk of the corpus during the map phase.
pub fn chunk_summary_instruction(chunk: &str, max_chars: usize) -> String {
    format!(
        "Summarize the following excerpt of study notes in at most {max_chars} characters. \
         Keep every definition, doctrine, and normative rule that appears; drop repetition \
         and filler. Use only content present in the excerpt; do not add anything.\n\n\
         EXCERPT:\n{chunk}"
    )
}

/// Prompt for the reduce phase over the joined partial summaries.
pub fn meta_summary_instruction(partial_summaries: &str, max_chars: usize) -> String {
    format!(
        "The following are ordered summaries of consecutive sections of one set of study \
         notes. Merge them into a single digest of at most {max_chars} characters that \
         preserves the key concepts, definitions, and doctrinal structure. Use only \
         content present in the summaries; do not add anything.\n\n\
         SECTION SUMMARIES:\n{partial_summaries}"
    )
}

/// Prompt for generating one exam question for the chosen area.
pub fn question_instruction(corpus: &str, area: ExamArea) -> String {
    format!(
        "Use exclusively this study material:\n\n{corpus}\n\n\
         Write one final-degree exam question for the area of {area}. \
         The question must be very difficult, brief, and answerable solely from the \
         material above. Do not reference doctrine or citations that are absent from it. \
         Reply with the question only."
    )
}

/// Prompt for grading a student answer against the corpus.
///
/// Embeds the question and answer verbatim, untruncated, and requests
/// the labeled three-part contract the [`common::session::Evaluation`]
/// parser understands.
pub fn evaluation_instruction(
    corpus: &str,
    area: ExamArea,
    question: &str,
    answer: &str,
) -> String {
    format!(
        "You are grading a final-degree exam answer for the area of {area}.\n\n\
         QUESTION:\n{question}\n\n\
         STUDENT ANSWER:\n{answer}\n\n\
         Grade strictly against this study material and nothing else:\n\n{corpus}\n\n\
         Reply in exactly three labeled parts:\n\
         Grade: a single number between 1.0 and 7.0\n\
         Analysis: a critical analysis of the student answer\n\
         Model answer: the correct answer, citing only doctrine and provisions that \
         appear in the material above"
    )
}
