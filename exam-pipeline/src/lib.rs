//! Pipeline turning uploaded study notes into a bounded corpus and
//! driving question generation and answer grading against it.
pub mod assembler;
pub mod completion;
pub mod pipeline;
pub mod reducer;
mod utils;

pub use pipeline::{ExamConfig, ExamPipeline};
pub use reducer::{ChunkStrategy, ReductionTuning};
pub use utils::file_text_extraction::{
    DefaultTextExtractor, DocumentKind, ExtractionOutcome, TextExtractor,
};
