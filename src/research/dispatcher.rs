//! Concurrent search dispatch
//!
//! Every intent is searched at once, without throttling. A failed or timed
//! out search is logged and dropped at the join point; it never cancels its
//! siblings.

use crate::agents::{AgentError, BrowserExplorer, Searcher};
use crate::types::{SearchIntent, SearchOutcome};
use futures::stream::FuturesOrdered;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{Instrument, Span};

/// Await `call`, failing with [`AgentError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T, F>(
    agent: &'static str,
    limit: Option<Duration>,
    call: F,
) -> Result<T, AgentError>
where
    F: Future<Output = Result<T, AgentError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AgentError::Timeout {
                agent,
                secs: limit.as_secs(),
            })?,
        None => call.await,
    }
}

/// Runs one search, folding any failure into [`SearchOutcome::Failed`].
async fn run_search(
    searcher: Arc<dyn Searcher>,
    intent: SearchIntent,
    limit: Option<Duration>,
) -> SearchOutcome {
    match with_timeout("search", limit, searcher.search(&intent)).await {
        Ok(findings) => SearchOutcome::Findings(findings),
        Err(e) => {
            tracing::warn!(query = %intent.query, error = %e, "Search failed, skipping");
            SearchOutcome::Failed
        }
    }
}

/// Fans intents out to a searcher or browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Search every intent concurrently and return the findings in the
    /// order the searches finished.
    pub async fn dispatch(
        &self,
        searcher: Arc<dyn Searcher>,
        intents: Vec<SearchIntent>,
    ) -> Vec<String> {
        let total = intents.len();
        let mut set = JoinSet::new();

        for intent in intents {
            let searcher = Arc::clone(&searcher);
            set.spawn(run_search(searcher, intent, self.timeout).instrument(Span::current()));
        }

        let mut findings = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => findings.extend(outcome.into_findings()),
                Err(e) => tracing::error!(error = %e, "Search task panicked"),
            }
        }

        tracing::info!(
            succeeded = findings.len(),
            failed = total - findings.len(),
            "Searches finished"
        );
        findings
    }

    /// Start every search concurrently, yielding outcomes in intent order.
    ///
    /// The returned futures make progress while the stream is polled and are
    /// cancelled with it.
    pub fn dispatch_ordered(
        &self,
        searcher: Arc<dyn Searcher>,
        intents: &[SearchIntent],
    ) -> FuturesOrdered<impl Future<Output = SearchOutcome> + Send + 'static> {
        intents
            .iter()
            .cloned()
            .map(|intent| {
                run_search(Arc::clone(&searcher), intent, self.timeout).instrument(Span::current())
            })
            .collect()
    }

    /// Browse the intents that carry a source hint; the rest are skipped.
    pub async fn explore(
        &self,
        browser: Arc<dyn BrowserExplorer>,
        intents: &[SearchIntent],
    ) -> Vec<String> {
        let mut set = JoinSet::new();

        for intent in intents.iter().filter(|i| i.source_hint.is_some()).cloned() {
            let browser = Arc::clone(&browser);
            let limit = self.timeout;
            set.spawn(
                async move {
                    match with_timeout("browser", limit, browser.explore(&intent)).await {
                        Ok(found) => found,
                        Err(e) => {
                            tracing::warn!(
                                url = intent.source_hint.as_deref().unwrap_or_default(),
                                error = %e,
                                "Browsing failed, skipping"
                            );
                            None
                        }
                    }
                }
                .instrument(Span::current()),
            );
        }

        let mut findings = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(found) => findings.extend(found),
                Err(e) => tracing::error!(error = %e, "Browse task panicked"),
            }
        }
        findings
    }
}
