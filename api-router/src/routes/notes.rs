use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::info;

use common::session::UploadedDocument;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct ProcessNotesParams {
    #[form_data(limit = "10000000")]
    #[form_data(default)]
    pub files: Vec<FieldData<NamedTempFile>>,
}

/// Builds a fresh exam session from the uploaded notes, replacing any
/// session a previous upload created.
pub async fn process_notes(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<ProcessNotesParams>,
) -> Result<impl IntoResponse, ApiError> {
    info!(file_count = input.files.len(), "received notes upload");

    // The temp files in `input` own the uploaded bytes; they must stay
    // alive until processing finishes.
    let documents: Vec<UploadedDocument> = input
        .files
        .iter()
        .map(|file| {
            let name = file.metadata.file_name.clone().unwrap_or_default();
            UploadedDocument::new(name, file.contents.path())
        })
        .collect();

    let mut slot = state.session.lock().await;
    let session = state.pipeline.process_notes(&documents).await?;
    let corpus_chars = session.corpus.chars().count();
    let session_id = session.id.clone();
    *slot = Some(session);

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "session_id": session_id,
            "corpus_chars": corpus_chars,
        })),
    ))
}
