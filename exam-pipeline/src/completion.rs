use std::sync::Arc;

use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use common::error::AppError;

/// Divisor mapping a character budget to a token cap. Deliberately
/// generous (real prose runs closer to four characters per token) so
/// the hard cap lands above the requested budget; the reducer trims the
/// overrun afterwards.
const APPROX_CHARS_PER_TOKEN: usize = 3;

/// Floor for the token cap so tiny character budgets still yield a
/// usable response.
const MIN_OUTPUT_TOKENS: u32 = 16;

/// The text-generation boundary: a prompt and an output-length cap in,
/// generated text out. Failures are opaque and treated as retryable by
/// the reducer.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        max_output_chars: usize,
    ) -> Result<String, AppError>;
}

/// Chat-completions implementation over the configured OpenAI-compatible
/// endpoint.
pub struct OpenAiCompletionService {
    client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    model: String,
}

impl OpenAiCompletionService {
    pub fn new(
        client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn token_cap(max_output_chars: usize) -> u32 {
        let tokens = max_output_chars / APPROX_CHARS_PER_TOKEN;
        u32::try_from(tokens).unwrap_or(u32::MAX).max(MIN_OUTPUT_TOKENS)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionService {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        max_output_chars: usize,
    ) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_completion_tokens(Self::token_cap(max_output_chars))
            .messages([
                ChatCompletionRequestSystemMessage::from(system).into(),
                ChatCompletionRequestUserMessage::from(prompt).into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or(AppError::LLMParsing(
                "No content found in LLM response".into(),
            ))?;

        Ok(content.clone())
    }
}
