//! Hierarchical corpus reduction: chunk, summarize each chunk, then
//! summarize the summaries into a bounded digest.
//!
//! This is what makes an arbitrarily large pile of study notes safe to
//! embed in a single bounded-context completion request. Fixed-width
//! chunking trades boundary precision for predictable request sizing;
//! the map-then-reduce pass bounds total model context regardless of
//! source length, at the cost of detail and of anything past the chunk
//! cap.

use std::time::Duration;

use text_splitter::TextSplitter;
use tokio_retry::Retry;
use tracing::{debug, info, warn};

use common::error::AppError;

use crate::completion::CompletionService;
use crate::utils::llm_instructions::{
    chunk_summary_instruction, meta_summary_instruction, SUMMARY_SYSTEM_MESSAGE,
};

/// How the corpus is partitioned before the map phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Fixed-width character slices, non-overlapping, covering the
    /// corpus exactly once in order. The default and the contract the
    /// coverage tests assert.
    #[default]
    FixedWidth,
    /// Boundary-aware splitting via `text-splitter`; same downstream
    /// contract, but slices land on semantic boundaries and may be
    /// shorter than the configured width.
    SentenceAware,
}

/// Every policy knob of the reduction, explicit and overridable.
#[derive(Clone, Debug)]
pub struct ReductionTuning {
    /// Corpora shorter than this pass through unreduced (no model calls).
    pub pass_through_chars: usize,
    /// Width of one chunk in characters.
    pub chunk_width_chars: usize,
    /// Early-stop cap: at most this many chunks are summarized; later
    /// chunks are dropped (documented lossy truncation, not a failure).
    pub chunk_cap: usize,
    /// Character budget requested for each partial summary.
    pub chunk_summary_max_chars: usize,
    /// Hard bound on the final digest.
    pub digest_max_chars: usize,
    /// Total attempts per completion call, first try included.
    pub retry_attempts: usize,
    /// Linear backoff base: attempt n waits n times this long.
    pub retry_base_delay_ms: u64,
    pub chunk_strategy: ChunkStrategy,
}

impl Default for ReductionTuning {
    fn default() -> Self {
        Self {
            pass_through_chars: 30_000,
            chunk_width_chars: 6_000,
            chunk_cap: 12,
            chunk_summary_max_chars: 1_200,
            digest_max_chars: 8_000,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            chunk_strategy: ChunkStrategy::FixedWidth,
        }
    }
}

/// Reduces `corpus` to at most `digest_max_chars` characters.
///
/// Below the pass-through threshold the corpus is returned unchanged.
/// Chunk summaries are retried on failure and degrade to empty strings
/// when the retry budget is exhausted; the meta pass is retried on the
/// same schedule but exhaustion there is fatal, since silently replacing
/// existing source text with nothing would poison every later prompt.
/// When every partial summary came back empty the meta call is skipped
/// and an empty digest is returned.
pub async fn reduce_corpus(
    corpus: &str,
    tuning: &ReductionTuning,
    completion: &dyn CompletionService,
) -> Result<String, AppError> {
    validate_tuning(tuning)?;

    let corpus_chars = corpus.chars().count();
    if corpus_chars < tuning.pass_through_chars {
        debug!(
            corpus_chars,
            threshold = tuning.pass_through_chars,
            "corpus below reduction threshold; passing through"
        );
        return Ok(corpus.to_string());
    }

    let chunks = partition(corpus, tuning);
    let total_chunks = chunks.len();
    if total_chunks > tuning.chunk_cap {
        warn!(
            total_chunks,
            cap = tuning.chunk_cap,
            dropped = total_chunks - tuning.chunk_cap,
            "chunk cap reached; later chunks will not contribute to the digest"
        );
    }

    let mut partials = Vec::with_capacity(total_chunks.min(tuning.chunk_cap));
    for (index, chunk) in chunks.iter().take(tuning.chunk_cap).enumerate() {
        match summarize_chunk(chunk, tuning, completion).await {
            Ok(summary) => partials.push(summary),
            Err(err) => {
                warn!(
                    chunk = index,
                    error = %err,
                    "chunk summary failed after retries; contributing empty summary"
                );
                partials.push(String::new());
            }
        }
    }

    let intermediate = partials.join("\n");
    if intermediate.trim().is_empty() {
        warn!("every chunk summary came back empty; returning empty digest");
        return Ok(String::new());
    }

    let meta_prompt = meta_summary_instruction(&intermediate, tuning.digest_max_chars);
    let digest = Retry::spawn(backoff_schedule(tuning), || {
        completion.generate(SUMMARY_SYSTEM_MESSAGE, &meta_prompt, tuning.digest_max_chars)
    })
    .await?;

    let digest = truncate_chars(&digest, tuning.digest_max_chars);
    info!(
        corpus_chars,
        digest_chars = digest.chars().count(),
        summarized_chunks = partials.len(),
        total_chunks,
        "corpus reduced"
    );

    Ok(digest)
}

async fn summarize_chunk(
    chunk: &str,
    tuning: &ReductionTuning,
    completion: &dyn CompletionService,
) -> Result<String, AppError> {
    let prompt = chunk_summary_instruction(chunk, tuning.chunk_summary_max_chars);
    Retry::spawn(backoff_schedule(tuning), || {
        completion.generate(
            SUMMARY_SYSTEM_MESSAGE,
            &prompt,
            tuning.chunk_summary_max_chars,
        )
    })
    .await
}

fn partition(corpus: &str, tuning: &ReductionTuning) -> Vec<String> {
    match tuning.chunk_strategy {
        ChunkStrategy::FixedWidth => fixed_width_chunks(corpus, tuning.chunk_width_chars),
        ChunkStrategy::SentenceAware => {
            let splitter = TextSplitter::new(tuning.chunk_width_chars);
            splitter.chunks(corpus).map(str::to_owned).collect()
        }
    }
}

/// Slices the corpus into consecutive chunks of `width` characters, the
/// last one possibly shorter. Operates on char boundaries so multi-byte
/// text never splits mid-character.
fn fixed_width_chunks(corpus: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0_usize;

    for ch in corpus.chars() {
        current.push(ch);
        count = count.saturating_add(1);
        if count == width {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Linear retry schedule: attempt n waits n times the base delay.
/// Yields `retry_attempts - 1` delays, so the total attempt count
/// matches the configured budget.
fn backoff_schedule(tuning: &ReductionTuning) -> impl Iterator<Item = Duration> {
    let base = Duration::from_millis(tuning.retry_base_delay_ms);
    (1..tuning.retry_attempts).map(move |attempt| base.saturating_mul(attempt as u32))
}

/// Char-boundary-safe defensive truncation for service overruns.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

fn validate_tuning(tuning: &ReductionTuning) -> Result<(), AppError> {
    if tuning.chunk_width_chars == 0 {
        return Err(AppError::Validation(
            "chunk_width_chars must be greater than zero".into(),
        ));
    }
    if tuning.retry_attempts == 0 {
        return Err(AppError::Validation(
            "retry_attempts must be greater than zero".into(),
        ));
    }
    if tuning.digest_max_chars == 0 {
        return Err(AppError::Validation(
            "digest_max_chars must be greater than zero".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;

    /// Completion stub answering every request with a short canned
    /// summary and recording the prompts it saw.
    struct CannedCompletion {
        prompts: Mutex<Vec<String>>,
    }

    impl CannedCompletion {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }

        async fn chunk_calls(&self) -> usize {
            self.prompts
                .lock()
                .await
                .iter()
                .filter(|prompt| prompt.contains("EXCERPT:"))
                .count()
        }
    }

    #[async_trait]
    impl CompletionService for CannedCompletion {
        async fn generate(
            &self,
            _system: &str,
            prompt: &str,
            _max_output_chars: usize,
        ) -> Result<String, AppError> {
            self.prompts.lock().await.push(prompt.to_string());
            Ok("canned summary".to_string())
        }
    }

    /// Stub that fails every call.
    struct AlwaysFailing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for AlwaysFailing {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _max_output_chars: usize,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Processing("service unavailable".to_string()))
        }
    }

    /// Stub that fails a fixed number of times, then succeeds.
    struct FlakyCompletion {
        remaining_failures: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for FlakyCompletion {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _max_output_chars: usize,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .remaining_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                Err(AppError::Processing("quota exceeded".to_string()))
            } else {
                Ok("eventual summary".to_string())
            }
        }
    }

    /// Stub that must never be reached.
    struct UnreachableCompletion;

    #[async_trait]
    impl CompletionService for UnreachableCompletion {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _max_output_chars: usize,
        ) -> Result<String, AppError> {
            unreachable!("no completion call expected for a pass-through corpus")
        }
    }

    fn fast_tuning() -> ReductionTuning {
        ReductionTuning {
            pass_through_chars: 100,
            chunk_width_chars: 50,
            chunk_cap: 12,
            chunk_summary_max_chars: 120,
            digest_max_chars: 400,
            retry_attempts: 3,
            retry_base_delay_ms: 10,
            chunk_strategy: ChunkStrategy::FixedWidth,
        }
    }

    fn corpus_of_chars(len: usize) -> String {
        "abcdefghij".chars().cycle().take(len).collect()
    }

    #[test]
    fn test_fixed_width_chunks_reconstruct_the_corpus() {
        let corpus = "años de doctrina y jurisprudencia — artículo 19 Nº 3";
        let chunks = fixed_width_chunks(corpus, 7);

        assert!(chunks.iter().rev().skip(1).all(|c| c.chars().count() == 7));
        assert!(chunks.last().is_some_and(|c| c.chars().count() <= 7));
        assert_eq!(chunks.concat(), corpus);
    }

    #[test]
    fn test_fixed_width_chunk_count() {
        let chunks = fixed_width_chunks(&corpus_of_chars(1_000), 50);
        assert_eq!(chunks.len(), 20);
    }

    #[tokio::test]
    async fn test_pass_through_below_threshold_makes_no_calls() {
        let tuning = fast_tuning();
        let corpus = corpus_of_chars(99);

        let reduced = reduce_corpus(&corpus, &tuning, &UnreachableCompletion)
            .await
            .expect("reduce");
        assert_eq!(reduced, corpus);
    }

    #[tokio::test]
    async fn test_digest_never_exceeds_cap() {
        let completion = CannedCompletion::new();
        let mut tuning = fast_tuning();
        // Force an overrun: the stub always answers 14 chars.
        tuning.digest_max_chars = 5;

        let reduced = reduce_corpus(&corpus_of_chars(500), &tuning, &completion)
            .await
            .expect("reduce");
        assert_eq!(reduced, "canne");
        assert_eq!(reduced.chars().count(), tuning.digest_max_chars);
    }

    #[tokio::test]
    async fn test_chunk_cap_limits_summary_calls() {
        let completion = CannedCompletion::new();
        let tuning = fast_tuning();
        // 1000 chars at width 50 is 20 chunks; the cap is 12.
        let reduced = reduce_corpus(&corpus_of_chars(1_000), &tuning, &completion)
            .await
            .expect("reduce");

        assert!(!reduced.is_empty());
        assert_eq!(completion.chunk_calls().await, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failures_degrade_to_empty_digest() {
        let completion = AlwaysFailing {
            calls: AtomicUsize::new(0),
        };
        let mut tuning = fast_tuning();
        tuning.chunk_cap = 4;

        let reduced = reduce_corpus(&corpus_of_chars(200), &tuning, &completion)
            .await
            .expect("degraded reduction still completes");

        assert!(reduced.is_empty());
        // 4 chunks, 3 attempts each; the meta pass is skipped entirely.
        assert_eq!(completion.calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_final_attempt_with_linear_backoff() {
        let completion = FlakyCompletion {
            remaining_failures: AtomicUsize::new(2),
            calls: AtomicUsize::new(0),
        };
        let mut tuning = fast_tuning();
        tuning.pass_through_chars = 10;
        tuning.chunk_width_chars = 200;
        tuning.retry_base_delay_ms = 500;

        let started = tokio::time::Instant::now();
        let reduced = reduce_corpus(&corpus_of_chars(40), &tuning, &completion)
            .await
            .expect("reduce");

        // Two failures burn the first chunk attempts, the third succeeds,
        // then the meta call succeeds immediately.
        assert_eq!(completion.calls.load(Ordering::SeqCst), 4);
        assert_eq!(reduced, "eventual summary");
        // Linear schedule: 500ms after the first failure, 1000ms after
        // the second. The paused clock makes this exact.
        assert_eq!(started.elapsed(), Duration::from_millis(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_meta_failure_is_fatal_after_retries() {
        /// Succeeds for chunk prompts, fails the meta pass.
        struct MetaFailing {
            meta_calls: AtomicUsize,
        }

        #[async_trait]
        impl CompletionService for MetaFailing {
            async fn generate(
                &self,
                _system: &str,
                prompt: &str,
                _max_output_chars: usize,
            ) -> Result<String, AppError> {
                if prompt.contains("SECTION SUMMARIES:") {
                    self.meta_calls.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::Processing("meta outage".to_string()))
                } else {
                    Ok("partial".to_string())
                }
            }
        }

        let completion = MetaFailing {
            meta_calls: AtomicUsize::new(0),
        };
        let tuning = fast_tuning();

        let result = reduce_corpus(&corpus_of_chars(200), &tuning, &completion).await;
        assert!(result.is_err(), "meta exhaustion must abort the reduction");
        assert_eq!(completion.meta_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sentence_aware_strategy_still_bounds_output() {
        let completion = CannedCompletion::new();
        let mut tuning = fast_tuning();
        tuning.chunk_strategy = ChunkStrategy::SentenceAware;

        let corpus = "One sentence. Another sentence. ".repeat(20);
        let reduced = reduce_corpus(&corpus, &tuning, &completion)
            .await
            .expect("reduce");
        assert!(reduced.chars().count() <= tuning.digest_max_chars);
        assert!(completion.chunk_calls().await >= 1);
    }

    #[tokio::test]
    async fn test_zero_chunk_width_is_rejected() {
        let mut tuning = fast_tuning();
        tuning.chunk_width_chars = 0;

        let result = reduce_corpus(&corpus_of_chars(200), &tuning, &UnreachableCompletion).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
