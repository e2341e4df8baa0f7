use api_state::ApiState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use routes::{
    answer::evaluate_answer, liveness::live, notes::process_notes, question::generate_question,
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for the exam simulator API, version 1.
pub fn exam_routes_v1(app_state: &ApiState) -> Router {
    Router::new()
        .route("/live", get(live))
        .route(
            "/notes",
            post(process_notes)
                .layer(DefaultBodyLimit::max(app_state.upload_max_body_bytes)),
        )
        .route("/question", post(generate_question))
        .route("/answer", post(evaluate_answer))
        .with_state(app_state.clone())
}
