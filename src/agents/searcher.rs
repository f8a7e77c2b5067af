//! Search agent using daedra
//!
//! Runs the intent's query against DuckDuckGo via daedra, then asks the model
//! to condense the hits into a short, citation-friendly summary.

use super::{AgentError, Searcher};
use crate::llm::LLMClient;
use crate::types::SearchIntent;
use async_trait::async_trait;

const SEARCH_PROMPT: &str = "You are a research assistant. Given a search term and the web results for it, \
produce a concise summary of the results. The summary must be 2-3 paragraphs and less than 300 words. \
Capture the main points. Write succinctly; no need for complete sentences or good grammar. \
This will be consumed by someone synthesizing a report, so it is vital you capture the essence \
and ignore any fluff. Do not include any additional commentary other than the summary itself.";

/// Web search followed by LLM summarisation.
pub struct WebSearcher {
    llm: Box<dyn LLMClient>,
    system_prompt: String,
    num_results: usize,
}

/// One search hit, independent of the backend's types.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl WebSearcher {
    pub fn new(llm: Box<dyn LLMClient>, num_results: usize) -> Self {
        Self {
            llm,
            system_prompt: SEARCH_PROMPT.to_string(),
            num_results,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    async fn web_search(&self, query: &str) -> Result<Vec<SearchHit>, AgentError> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.num_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AgentError::Search(e.to_string()))?;

        Ok(response
            .data
            .iter()
            .map(|r| SearchHit {
                title: r.title.clone(),
                url: r.url.clone(),
                description: r.description.clone(),
            })
            .collect())
    }
}

/// Render the summariser input for one intent.
pub fn format_search_input(intent: &SearchIntent, hits: &[SearchHit]) -> String {
    let results = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {} ({})\n{}", i + 1, hit.title, hit.url, hit.description))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Search term: {}\nReason for searching: {}\n\nResults:\n{}",
        intent.query, intent.reason, results
    )
}

#[async_trait]
impl Searcher for WebSearcher {
    async fn search(&self, intent: &SearchIntent) -> Result<String, AgentError> {
        let hits = self.web_search(&intent.query).await?;
        if hits.is_empty() {
            return Err(AgentError::Search(format!(
                "no results for '{}'",
                intent.query
            )));
        }

        let summary = self
            .llm
            .generate_with_system(&self.system_prompt, &format_search_input(intent, &hits))
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AgentError::MalformedOutput {
                agent: "search",
                reason: "empty summary".to_string(),
            });
        }
        Ok(summary.to_string())
    }
}
