use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use common::session::ExamArea;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct QuestionParams {
    pub area: ExamArea,
}

/// Generates an exam question for the chosen area against the current
/// session corpus.
pub async fn generate_question(
    State(state): State<ApiState>,
    Json(params): Json<QuestionParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mut slot = state.session.lock().await;
    let session = slot.as_mut().ok_or_else(|| {
        ApiError::ValidationError("no notes have been processed yet".to_string())
    })?;

    let question = state.pipeline.generate_question(session, params.area).await?;

    Ok(Json(json!({
        "status": "success",
        "area": params.area,
        "question": question,
    })))
}
