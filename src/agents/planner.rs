use super::{json::parse_structured, AgentError, Planner};
use crate::llm::LLMClient;
use crate::types::SearchIntent;
use async_trait::async_trait;
use serde::Deserialize;

const PLANNER_PROMPT: &str = r#"You are a helpful research assistant. Given a query, come up with a set of web searches to perform to best answer the query. Output between 5 and 10 searches.

For each search give the search term, the reason it matters for the query and, when you know one, a URL worth reading in depth (otherwise an empty string).

Respond ONLY with valid JSON in this shape:
{"searches": [{"query": "...", "reason": "...", "url": ""}]}"#;

/// Plans web searches with an LLM.
pub struct LlmPlanner {
    llm: Box<dyn LLMClient>,
    system_prompt: String,
    max_searches: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WebSearchPlan {
    Wrapped { searches: Vec<SearchIntent> },
    Bare(Vec<SearchIntent>),
}

impl LlmPlanner {
    pub fn new(llm: Box<dyn LLMClient>, max_searches: usize) -> Self {
        Self {
            llm,
            system_prompt: PLANNER_PROMPT.to_string(),
            max_searches,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn parse_plan(&self, response: &str) -> Result<Vec<SearchIntent>, AgentError> {
        let plan: WebSearchPlan = parse_structured("planner", response)?;
        let searches = match plan {
            WebSearchPlan::Wrapped { searches } | WebSearchPlan::Bare(searches) => searches,
        };

        Ok(searches
            .into_iter()
            .filter(|intent| !intent.query.trim().is_empty())
            .take(self.max_searches)
            .collect())
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, query: &str) -> Result<Vec<SearchIntent>, AgentError> {
        let response = self
            .llm
            .generate_with_system(&self.system_prompt, &format!("Query: {}", query))
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        let intents = self.parse_plan(&response)?;
        tracing::debug!(count = intents.len(), "Planner produced search intents");
        Ok(intents)
    }
}
