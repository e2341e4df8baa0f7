use tracing::{debug, warn};

use common::session::UploadedDocument;

use crate::utils::file_text_extraction::{DocumentKind, ExtractionOutcome, TextExtractor};

/// Builds the working corpus from the uploaded documents, in upload order.
///
/// Unrecognized extensions are skipped silently and per-document
/// extraction failures contribute an empty string; neither aborts
/// assembly. Every non-empty contribution is followed by a single
/// newline, matching the legacy behavior.
pub async fn assemble_corpus(
    documents: &[UploadedDocument],
    extractor: &dyn TextExtractor,
) -> String {
    let mut corpus = String::new();

    for document in documents {
        let Some(kind) = DocumentKind::from_name(&document.name) else {
            debug!(name = %document.name, "skipping document with unrecognized extension");
            continue;
        };

        match extractor.extract(document, kind).await {
            ExtractionOutcome::Extracted(text) => {
                corpus.push_str(&text);
                corpus.push('\n');
            }
            ExtractionOutcome::Empty => {
                debug!(name = %document.name, "document extracted to empty text");
            }
            ExtractionOutcome::Failed(reason) => {
                warn!(
                    name = %document.name,
                    reason = %reason,
                    "extraction failed; document contributes nothing"
                );
            }
        }
    }

    corpus
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;

    /// Extractor answering from a fixed name -> outcome table.
    struct TableExtractor {
        outcomes: HashMap<String, ExtractionOutcome>,
    }

    #[async_trait]
    impl TextExtractor for TableExtractor {
        async fn extract(
            &self,
            document: &UploadedDocument,
            _kind: DocumentKind,
        ) -> ExtractionOutcome {
            self.outcomes
                .get(&document.name)
                .cloned()
                .unwrap_or(ExtractionOutcome::Empty)
        }
    }

    fn docs(names: &[&str]) -> Vec<UploadedDocument> {
        names
            .iter()
            .map(|name| UploadedDocument::new(*name, format!("/uploads/{name}")))
            .collect()
    }

    #[tokio::test]
    async fn test_concatenates_in_upload_order() {
        let extractor = TableExtractor {
            outcomes: HashMap::from([
                (
                    "a.pdf".to_string(),
                    ExtractionOutcome::Extracted("A. B.".to_string()),
                ),
                (
                    "b.docx".to_string(),
                    ExtractionOutcome::Extracted("C. D.".to_string()),
                ),
            ]),
        };

        let corpus = assemble_corpus(&docs(&["a.pdf", "b.docx"]), &extractor).await;
        assert_eq!(corpus, "A. B.\nC. D.\n");
    }

    #[tokio::test]
    async fn test_unrecognized_extension_is_skipped() {
        let extractor = TableExtractor {
            outcomes: HashMap::from([(
                "a.pdf".to_string(),
                ExtractionOutcome::Extracted("content".to_string()),
            )]),
        };

        let corpus =
            assemble_corpus(&docs(&["notes.txt", "a.pdf", "slides.pptx"]), &extractor).await;
        assert_eq!(corpus, "content\n");
    }

    #[tokio::test]
    async fn test_failed_extraction_contributes_empty_and_continues() {
        let extractor = TableExtractor {
            outcomes: HashMap::from([
                (
                    "broken.pdf".to_string(),
                    ExtractionOutcome::Failed("bad xref".to_string()),
                ),
                (
                    "good.docx".to_string(),
                    ExtractionOutcome::Extracted("still here".to_string()),
                ),
            ]),
        };

        let corpus = assemble_corpus(&docs(&["broken.pdf", "good.docx"]), &extractor).await;
        assert_eq!(corpus, "still here\n");
    }

    #[tokio::test]
    async fn test_no_documents_yields_empty_corpus() {
        let extractor = TableExtractor {
            outcomes: HashMap::new(),
        };
        let corpus = assemble_corpus(&[], &extractor).await;
        assert!(corpus.is_empty());
    }
}
