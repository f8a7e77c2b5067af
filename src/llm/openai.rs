use crate::llm::client::{LLMClient, ModelParams};
use crate::types::{AppError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: ModelParams,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, params: ModelParams) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            params,
        }
    }

    async fn complete(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.params.temperature)
            .max_tokens(self.params.max_tokens)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.complete(vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                system.to_string(),
            )),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                prompt.to_string(),
            )),
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
