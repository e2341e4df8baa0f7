use std::sync::Arc;

use tokio::sync::Mutex;

use common::session::ExamSession;
use exam_pipeline::ExamPipeline;

/// Shared state behind the exam routes.
///
/// One session slot, guarded by a mutex that each handler holds for its
/// whole operation: user actions run to completion before the next one
/// starts, and re-processing notes replaces the session outright.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<ExamPipeline>,
    pub session: Arc<Mutex<Option<ExamSession>>>,
    pub upload_max_body_bytes: usize,
}

impl ApiState {
    pub fn new(pipeline: Arc<ExamPipeline>, upload_max_body_bytes: usize) -> Self {
        Self {
            pipeline,
            session: Arc::new(Mutex::new(None)),
            upload_max_body_bytes,
        }
    }
}
