mod config;

pub use config::ExamConfig;

use std::{sync::Arc, time::Instant};

use tracing::{info, warn};

use common::{
    error::AppError,
    session::{Evaluation, ExamArea, ExamSession, UploadedDocument},
    transcript::{TranscriptEntry, TranscriptLog},
    utils::config::AppConfig,
};

use crate::{
    assembler::assemble_corpus,
    completion::{CompletionService, OpenAiCompletionService},
    reducer::reduce_corpus,
    utils::file_text_extraction::{DefaultTextExtractor, TextExtractor},
    utils::llm_instructions::{
        evaluation_instruction, question_instruction, EXAMINER_SYSTEM_MESSAGE,
    },
};

/// Orchestrates the three user actions: process notes, generate a
/// question, evaluate an answer. Holds no session state itself; the
/// caller owns the [`ExamSession`] and passes it in explicitly.
pub struct ExamPipeline {
    completion: Arc<dyn CompletionService>,
    extractor: Arc<dyn TextExtractor>,
    config: ExamConfig,
    transcript: Option<TranscriptLog>,
}

impl ExamPipeline {
    pub fn new(
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        app_config: &AppConfig,
    ) -> Self {
        Self::new_with_config(openai_client, app_config, ExamConfig::default())
    }

    pub fn new_with_config(
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        app_config: &AppConfig,
        config: ExamConfig,
    ) -> Self {
        let completion = Arc::new(OpenAiCompletionService::new(
            openai_client,
            app_config.completion_model.clone(),
        ));
        let transcript = app_config
            .transcript_path
            .as_ref()
            .map(TranscriptLog::new);

        Self::with_services(completion, Arc::new(DefaultTextExtractor), config, transcript)
    }

    pub fn with_services(
        completion: Arc<dyn CompletionService>,
        extractor: Arc<dyn TextExtractor>,
        config: ExamConfig,
        transcript: Option<TranscriptLog>,
    ) -> Self {
        Self {
            completion,
            extractor,
            config,
            transcript,
        }
    }

    /// Builds a fresh session from the uploaded documents: extract,
    /// assemble, reduce. The returned session replaces any earlier one;
    /// corpora are never merged.
    #[tracing::instrument(skip_all, fields(documents = documents.len()))]
    pub async fn process_notes(
        &self,
        documents: &[UploadedDocument],
    ) -> Result<ExamSession, AppError> {
        if documents.is_empty() {
            return Err(AppError::Validation(
                "at least one document must be uploaded".into(),
            ));
        }

        let started = Instant::now();
        let corpus = assemble_corpus(documents, self.extractor.as_ref()).await;
        let assembled_chars = corpus.chars().count();

        let reduced = reduce_corpus(&corpus, &self.config.tuning, self.completion.as_ref())
            .await?;

        info!(
            assembled_chars,
            corpus_chars = reduced.chars().count(),
            total_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "notes processed into session corpus"
        );

        Ok(ExamSession::new(reduced))
    }

    /// Generates one exam question for the area, overwriting whatever
    /// question the session held before.
    #[tracing::instrument(skip_all, fields(session_id = %session.id, area = %area))]
    pub async fn generate_question(
        &self,
        session: &mut ExamSession,
        area: ExamArea,
    ) -> Result<String, AppError> {
        if session.corpus.trim().is_empty() {
            return Err(AppError::Validation(
                "the session corpus is empty; process notes first".into(),
            ));
        }

        let prompt = question_instruction(&session.corpus, area);
        let question = self
            .completion
            .generate(EXAMINER_SYSTEM_MESSAGE, &prompt, self.config.question_max_chars)
            .await?;

        session.set_question(question.clone());
        info!(question_chars = question.chars().count(), "question generated");

        Ok(question)
    }

    /// Grades a free-text answer against the session corpus and the
    /// current question, records the result on the session, and appends
    /// a transcript entry when a log is configured.
    #[tracing::instrument(skip_all, fields(session_id = %session.id, area = %area))]
    pub async fn evaluate_answer(
        &self,
        session: &mut ExamSession,
        area: ExamArea,
        answer: &str,
    ) -> Result<Evaluation, AppError> {
        if answer.trim().is_empty() {
            return Err(AppError::Validation(
                "an answer must be written before requesting evaluation".into(),
            ));
        }
        let Some(question) = session.question.clone() else {
            return Err(AppError::Validation(
                "no question has been generated for this session".into(),
            ));
        };

        let prompt = evaluation_instruction(&session.corpus, area, &question, answer);
        let response = self
            .completion
            .generate(
                EXAMINER_SYSTEM_MESSAGE,
                &prompt,
                self.config.evaluation_max_chars,
            )
            .await?;

        let evaluation = Evaluation::parse(&response);
        if evaluation.is_raw_fallback() {
            warn!("evaluation response did not match the labeled contract; keeping raw text");
        }

        if let Some(log) = &self.transcript {
            let entry = TranscriptEntry::new(area, &question, answer, &evaluation.raw);
            // The transcript is an audit convenience; a failed append
            // must not fail the evaluation itself.
            if let Err(err) = log.append(&entry).await {
                warn!(error = %err, path = ?log.path(), "failed to append transcript entry");
            }
        }

        session.record_evaluation(evaluation.clone());
        info!(
            grade = ?evaluation.grade,
            parsed = !evaluation.is_raw_fallback(),
            "answer evaluated"
        );

        Ok(evaluation)
    }
}
