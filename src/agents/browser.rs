use super::{AgentError, BrowserExplorer};
use crate::llm::LLMClient;
use crate::types::SearchIntent;
use async_trait::async_trait;

const BROWSER_PROMPT: &str = "You are a browsing assistant. You are given the content of a web page and the \
reason it is being read. Extract the facts, figures and tables relevant to that reason and present them \
in a structured format. Keep numeric data in markdown tables where possible. If nothing on the page is \
relevant, answer with an empty response.";

/// Longest slice of page text handed to the model
const MAX_PAGE_CHARS: usize = 12_000;

/// Fetches the page an intent points at and extracts the relevant content.
pub struct PageExplorer {
    llm: Box<dyn LLMClient>,
    system_prompt: String,
}

impl PageExplorer {
    pub fn new(llm: Box<dyn LLMClient>) -> Self {
        Self {
            llm,
            system_prompt: BROWSER_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    async fn fetch(&self, url: &str) -> Result<String, AgentError> {
        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        daedra::tools::fetch::fetch_page(&fetch_args)
            .await
            .map(|page| page.content)
            .map_err(|e| AgentError::Fetch(format!("{}: {}", url, e)))
    }
}

/// Cut `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl BrowserExplorer for PageExplorer {
    async fn explore(&self, intent: &SearchIntent) -> Result<Option<String>, AgentError> {
        let Some(url) = intent.source_hint.as_deref() else {
            return Ok(None);
        };

        let content = self.fetch(url).await?;
        if content.trim().is_empty() {
            tracing::debug!(url, "Fetched page has no content");
            return Ok(None);
        }

        let prompt = format!(
            "Topic: {}\nReason for reading: {}\nSource: {}\n\nPage content:\n{}",
            intent.query,
            intent.reason,
            url,
            truncate_chars(&content, MAX_PAGE_CHARS)
        );

        let extracted = self
            .llm
            .generate_with_system(&self.system_prompt, &prompt)
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        let extracted = extracted.trim();
        Ok((!extracted.is_empty()).then(|| format!("Source: {}\n{}", url, extracted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Result;

    struct PanickingLLM;

    #[async_trait]
    impl LLMClient for PanickingLLM {
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            panic!("must not be called");
        }

        fn model_name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[tokio::test]
    async fn test_intent_without_hint_is_skipped() {
        let explorer = PageExplorer::new(Box::new(PanickingLLM));
        let result = explorer
            .explore(&SearchIntent::new("solar tariffs", "context"))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
