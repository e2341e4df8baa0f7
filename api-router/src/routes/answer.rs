use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use common::session::ExamArea;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AnswerParams {
    pub area: ExamArea,
    pub answer: String,
}

/// Grades the submitted answer against the current session's corpus and
/// question, returning the typed evaluation.
pub async fn evaluate_answer(
    State(state): State<ApiState>,
    Json(params): Json<AnswerParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mut slot = state.session.lock().await;
    let session = slot.as_mut().ok_or_else(|| {
        ApiError::ValidationError("no notes have been processed yet".to_string())
    })?;

    let evaluation = state
        .pipeline
        .evaluate_answer(session, params.area, &params.answer)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "evaluation": evaluation,
    })))
}
