use async_trait::async_trait;

use common::{error::AppError, session::UploadedDocument};

use super::docx_ingestion::extract_docx_text;

/// Document formats the simulator accepts. Anything else is skipped by
/// the assembler without raising an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Recognizes a document by its file-name extension, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Result of one best-effort extraction.
///
/// The legacy contract collapsed "document had no text" and "extraction
/// blew up" into the same empty string; both still contribute an empty
/// string to the corpus, but callers can now tell them apart and log the
/// failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted(String),
    Empty,
    Failed(String),
}

/// Seam for document-to-text conversion so tests can stub it.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &UploadedDocument, kind: DocumentKind)
        -> ExtractionOutcome;
}

/// Production extractor: text-layer PDF extraction and DOCX XML parsing,
/// both run off the async executor.
pub struct DefaultTextExtractor;

#[async_trait]
impl TextExtractor for DefaultTextExtractor {
    async fn extract(
        &self,
        document: &UploadedDocument,
        kind: DocumentKind,
    ) -> ExtractionOutcome {
        match extract_text(document, kind).await {
            Ok(text) if text.trim().is_empty() => ExtractionOutcome::Empty,
            Ok(text) => ExtractionOutcome::Extracted(text),
            Err(err) => ExtractionOutcome::Failed(err.to_string()),
        }
    }
}

async fn extract_text(
    document: &UploadedDocument,
    kind: DocumentKind,
) -> Result<String, AppError> {
    let bytes = tokio::fs::read(&document.path).await?;

    match kind {
        DocumentKind::Pdf => {
            tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes)
                    .map(|text| text.trim().to_string())
                    .map_err(|err| {
                        AppError::Extraction(format!("failed to extract PDF text: {err}"))
                    })
            })
            .await?
        }
        DocumentKind::Docx => {
            tokio::task::spawn_blocking(move || extract_docx_text(&bytes)).await?
        }
    }
}
