use crate::llm::client::{LLMClient, ModelParams};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
    models::ModelOptions,
};

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    params: ModelParams,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, params: ModelParams) -> Self {
        let (host, port) = split_base_url(&base_url);

        Self {
            client: Ollama::new(host, port),
            model,
            params,
        }
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let options = ModelOptions::default()
            .temperature(self.params.temperature)
            .num_predict(num_predict(self.params.max_tokens));
        let request = ChatMessageRequest::new(self.model.clone(), messages).options(options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Ollama takes a signed token limit; larger values saturate.
fn num_predict(max_tokens: u32) -> i32 {
    i32::try_from(max_tokens).unwrap_or(i32::MAX)
}

/// Split `scheme://host:port` into the `(scheme://host, port)` pair Ollama expects.
fn split_base_url(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", trimmed),
    };

    match rest.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(DEFAULT_OLLAMA_PORT),
        ),
        None => (format!("{}://{}", scheme, rest), DEFAULT_OLLAMA_PORT),
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
