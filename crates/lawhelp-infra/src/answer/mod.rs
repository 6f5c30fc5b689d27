//! Answer engine backed by an OpenAI-compatible chat completion endpoint.
//!
//! Every question is sent as a single-turn completion: a system prompt that
//! restricts answers to the legal text, and a user message carrying the
//! corpus followed by the question. Groq is the default endpoint; any
//! OpenAI-compatible base URL works.

pub mod corpus;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use lawhelp_core::answer::engine::AnswerEngine;
use lawhelp_types::config::AnswerConfig;
use lawhelp_types::error::AnswerError;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use self::corpus::LegalCorpus;

/// Returned when the endpoint answers with no content.
pub const EMPTY_ANSWER_FALLBACK: &str = "No answer provided.";

/// Answers legal questions grounded in a [`LegalCorpus`].
///
/// Does NOT derive Debug: the async-openai client holds the API key.
pub struct LegalAnswerEngine {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
    corpus: LegalCorpus,
}

impl LegalAnswerEngine {
    pub fn new(config: &AnswerConfig, api_key: &SecretString, corpus: LegalCorpus) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
            corpus,
        }
    }

    pub fn corpus(&self) -> &LegalCorpus {
        &self.corpus
    }

    fn build_request(&self, question: &str) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    self.system_prompt.clone(),
                ),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(
                    self.corpus.prompt_for(question),
                ),
                name: None,
            }),
        ];

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            ..Default::default()
        }
    }
}

impl AnswerEngine for LegalAnswerEngine {
    async fn generate_answer(&self, question: &str) -> Result<String, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::InvalidRequest("empty question".to_string()));
        }

        let response = self
            .client
            .chat()
            .create(self.build_request(question))
            .await
            .map_err(map_openai_error)?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| EMPTY_ANSWER_FALLBACK.to_string());

        debug!(model = %response.model, chars = answer.len(), "Answer generated");
        Ok(answer)
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`AnswerError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> AnswerError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            if code == "context_length_exceeded" || code == "invalid_request_error" {
                AnswerError::InvalidRequest(api_err.message.clone())
            } else {
                AnswerError::Provider(api_err.message.clone())
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status() {
            Some(status) if status.as_u16() == 400 => AnswerError::InvalidRequest(err.to_string()),
            _ => AnswerError::Provider(err.to_string()),
        },
        OpenAIError::InvalidArgument(msg) => AnswerError::InvalidRequest(msg.clone()),
        _ => AnswerError::Provider(err.to_string()),
    }
}
