//! Agent Registry
//!
//! Builds the research roles declared under `[agents]` in `delve.toml`.
//! Each role names a model from `[models]`; the [`ProviderRegistry`] turns
//! that name into a live LLM client. A role's `system_prompt`, when set,
//! replaces the built-in instructions.

use crate::agents::{LlmPlanner, LlmWriter, PageExplorer, WebSearcher};
use crate::llm::{LLMClient, ProviderRegistry};
use crate::research::ResearchAgents;
use crate::tools::chart::QuickChartRenderer;
use crate::types::Result;
use crate::utils::config::{DelveConfig, RoleConfig};
use std::sync::Arc;

/// Creates the agent set for the research pipeline from configuration.
pub struct AgentRegistry {
    config: Arc<DelveConfig>,
    provider_registry: ProviderRegistry,
}

impl AgentRegistry {
    pub fn from_config(config: Arc<DelveConfig>) -> Self {
        Self {
            provider_registry: ProviderRegistry::from_config(Arc::clone(&config)),
            config,
        }
    }

    pub fn provider_registry(&self) -> &ProviderRegistry {
        &self.provider_registry
    }

    async fn client_for(&self, role: &str, role_config: &RoleConfig) -> Result<Box<dyn LLMClient>> {
        tracing::debug!(role, model = %role_config.model, "Creating LLM client");
        self.provider_registry
            .create_client_for_model(&role_config.model)
            .await
    }

    /// Build every configured role.
    ///
    /// The browser is only created when `[agents.browser]` exists; runs
    /// that ask for browsing without it simply skip the stage.
    pub async fn build(&self) -> Result<ResearchAgents> {
        let agents = &self.config.agents;
        let pipeline = &self.config.pipeline;

        let mut planner = LlmPlanner::new(
            self.client_for("planner", &agents.planner).await?,
            pipeline.max_searches,
        );
        if let Some(prompt) = &agents.planner.system_prompt {
            planner = planner.with_system_prompt(prompt.clone());
        }

        let mut searcher = WebSearcher::new(
            self.client_for("search", &agents.search).await?,
            pipeline.search_results_per_query,
        );
        if let Some(prompt) = &agents.search.system_prompt {
            searcher = searcher.with_system_prompt(prompt.clone());
        }

        let mut writer = LlmWriter::new(self.client_for("writer", &agents.writer).await?);
        if let Some(prompt) = &agents.writer.system_prompt {
            writer = writer.with_system_prompt(prompt.clone());
        }

        let mut agent_set = ResearchAgents::new(
            Arc::new(planner),
            Arc::new(searcher),
            Arc::new(writer),
            Arc::new(QuickChartRenderer::from_config(&self.config.charts)),
        );

        if let Some(browser_config) = &agents.browser {
            let mut browser = PageExplorer::new(self.client_for("browser", browser_config).await?);
            if let Some(prompt) = &browser_config.system_prompt {
                browser = browser.with_system_prompt(prompt.clone());
            }
            agent_set = agent_set.with_browser(Arc::new(browser));
        }

        tracing::info!(
            planner = %agents.planner.model,
            search = %agents.search.model,
            writer = %agents.writer.model,
            browser = agents.browser.is_some(),
            "Research agents ready"
        );

        Ok(agent_set)
    }
}
