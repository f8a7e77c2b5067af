//! Pipeline controller
//!
//! Runs `plan -> search [-> browse] -> write -> resolve` for one query, either
//! to completion ([`ResearchPipeline::run`]) or as an event stream
//! ([`ResearchPipeline::stream`]). Stages are strictly sequential; only the
//! search and browse stages fan out.

use super::context::RunContext;
use super::dispatcher::{with_timeout, Dispatcher};
use super::events::{PipelineEvent, Stage};
use super::resolver::PlaceholderResolver;
use super::synthesizer::ReportSynthesizer;
use crate::agents::{AgentError, BrowserExplorer, Planner, Searcher, Writer};
use crate::tools::chart::ChartRenderer;
use crate::types::{
    AppError, Report, ResearchRequest, ResearchResponse, Result, SearchIntent, SearchOutcome,
};
use crate::utils::config::PipelineConfig;
use futures::{FutureExt, Stream, StreamExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// The collaborators a pipeline run calls out to.
#[derive(Clone)]
pub struct ResearchAgents {
    pub planner: Arc<dyn Planner>,
    pub searcher: Arc<dyn Searcher>,
    pub writer: Arc<dyn Writer>,
    pub charts: Arc<dyn ChartRenderer>,
    pub browser: Option<Arc<dyn BrowserExplorer>>,
}

impl ResearchAgents {
    pub fn new(
        planner: Arc<dyn Planner>,
        searcher: Arc<dyn Searcher>,
        writer: Arc<dyn Writer>,
        charts: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            planner,
            searcher,
            writer,
            charts,
            browser: None,
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserExplorer>) -> Self {
        self.browser = Some(browser);
        self
    }
}

/// Stream of events for one run.
///
/// Dropping it (for example when an SSE client disconnects) aborts the run.
pub struct EventStream {
    trace_id: String,
    events: mpsc::Receiver<PipelineEvent>,
    task: JoinHandle<()>,
}

impl EventStream {
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }
}

impl Stream for EventStream {
    type Item = PipelineEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            tracing::info!(trace_id = %self.trace_id, "Event stream dropped, aborting run");
            self.task.abort();
        }
    }
}

/// Event sink for streaming runs; a closed receiver cancels the run.
struct Emitter<'a> {
    trace_id: &'a str,
    tx: &'a mpsc::Sender<PipelineEvent>,
}

impl Emitter<'_> {
    async fn emit(&self, event: PipelineEvent) -> Result<()> {
        tracing::debug!(event = event.kind(), "Emitting event");
        self.tx.send(event).await.map_err(|_| AppError::Cancelled)
    }

    async fn status(&self, stage: Stage) -> Result<()> {
        self.emit(PipelineEvent::status(self.trace_id, stage)).await
    }
}

/// Await a run, turning a panic anywhere inside it into [`AppError::Internal`].
async fn contain_panic<T>(run: impl Future<Output = Result<T>>) -> Result<T> {
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(AppError::Internal(format!(
            "research run panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Orchestrates research runs over a fixed agent set.
pub struct ResearchPipeline {
    agents: ResearchAgents,
    config: PipelineConfig,
    dispatcher: Dispatcher,
    synthesizer: ReportSynthesizer,
    resolver: PlaceholderResolver,
}

impl ResearchPipeline {
    pub fn new(agents: ResearchAgents, config: PipelineConfig) -> Self {
        let timeout = config.agent_timeout();
        Self {
            dispatcher: Dispatcher::new(timeout),
            synthesizer: ReportSynthesizer::new(Arc::clone(&agents.writer), timeout),
            resolver: PlaceholderResolver::new(Arc::clone(&agents.charts), timeout),
            agents,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The browser to use for this run, if browsing is requested and possible.
    fn browser_for(&self, requested: Option<bool>) -> Option<Arc<dyn BrowserExplorer>> {
        if !requested.unwrap_or(self.config.browse) {
            return None;
        }
        if self.agents.browser.is_none() {
            tracing::warn!("Browsing requested but no browser agent is configured; skipping");
        }
        self.agents.browser.clone()
    }

    async fn plan(&self, query: &str) -> std::result::Result<Vec<SearchIntent>, AgentError> {
        tracing::info!(stage = ?Stage::Planning, "Planning searches");
        let intents = with_timeout(
            "planner",
            self.config.agent_timeout(),
            self.agents.planner.plan(query),
        )
        .await?;

        tracing::info!(searches = intents.len(), "Plan ready");
        Ok(intents)
    }

    async fn browse(
        &self,
        browser: Arc<dyn BrowserExplorer>,
        intents: &[SearchIntent],
    ) -> Vec<String> {
        tracing::info!(stage = ?Stage::Browsing, "Browsing source pages");
        let pages = self.dispatcher.explore(browser, intents).await;
        tracing::info!(pages = pages.len(), "Browsing finished");
        pages
    }

    async fn write(&self, query: &str, findings: &[String]) -> std::result::Result<Report, AgentError> {
        tracing::info!(stage = ?Stage::Writing, findings = findings.len(), "Writing report");
        let mut report = self.synthesizer.synthesize(query, findings).await?;

        tracing::info!(stage = ?Stage::ResolvingPlaceholders, "Resolving chart placeholders");
        let resolved = self.resolver.resolve(&mut report).await;
        tracing::info!(
            resolved,
            requested = report.visualization_requests.len(),
            "Charts resolved"
        );
        Ok(report)
    }

    fn response(ctx: &RunContext, report: Report) -> ResearchResponse {
        ResearchResponse {
            trace_id: ctx.trace_id().to_string(),
            report: report.body,
            summary: report.summary,
            follow_up_questions: report.follow_up_questions,
        }
    }

    /// Run a query to completion.
    pub async fn run(&self, request: &ResearchRequest) -> Result<ResearchResponse> {
        request.validate()?;
        let ctx = RunContext::new(request.query.trim());

        async {
            tracing::info!(query = ctx.query(), "Starting research");
            let result = contain_panic(self.run_batch(&ctx, request.browse)).await;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms = ctx.elapsed_ms(), "Research complete"),
                Err(e) => tracing::error!(stage = ?Stage::Failed, error = %e, "Research failed"),
            }
            result
        }
        .instrument(ctx.span().clone())
        .await
    }

    async fn run_batch(&self, ctx: &RunContext, browse: Option<bool>) -> Result<ResearchResponse> {
        let intents = self.plan(ctx.query()).await?;

        tracing::info!(stage = ?Stage::Searching, "Performing searches");
        let mut findings = self
            .dispatcher
            .dispatch(Arc::clone(&self.agents.searcher), intents.clone())
            .await;

        if let Some(browser) = self.browser_for(browse) {
            findings.extend(self.browse(browser, &intents).await);
        }

        let report = self.write(ctx.query(), &findings).await?;
        Ok(Self::response(ctx, report))
    }

    /// Start a run in the background and return its event stream.
    ///
    /// The stream always ends with `complete` or `error`, unless it is
    /// dropped first.
    pub fn stream(self: Arc<Self>, request: ResearchRequest) -> Result<EventStream> {
        request.validate()?;
        let ctx = RunContext::new(request.query.trim());
        let trace_id = ctx.trace_id().to_string();
        let (tx, rx) = mpsc::channel(self.config.stream_channel_capacity.max(1));

        let span = ctx.span().clone();
        let task = tokio::spawn(
            async move {
                tracing::info!(query = ctx.query(), "Starting streamed research");
                match contain_panic(self.run_streaming(&ctx, request.browse, &tx)).await {
                    Ok(()) => {
                        tracing::info!(elapsed_ms = ctx.elapsed_ms(), "Research complete")
                    }
                    Err(AppError::Cancelled) => {
                        tracing::info!("Client went away, research stopped")
                    }
                    Err(e) => {
                        tracing::error!(stage = ?Stage::Failed, error = %e, "Research failed");
                        let _ = tx.send(PipelineEvent::error(ctx.trace_id(), e.to_string())).await;
                    }
                }
            }
            .instrument(span),
        );

        Ok(EventStream {
            trace_id,
            events: rx,
            task,
        })
    }

    async fn run_streaming(
        &self,
        ctx: &RunContext,
        browse: Option<bool>,
        tx: &mpsc::Sender<PipelineEvent>,
    ) -> Result<()> {
        let emitter = Emitter {
            trace_id: ctx.trace_id(),
            tx,
        };
        let trace_id = ctx.trace_id();

        emitter.emit(PipelineEvent::start(trace_id, ctx.query())).await?;

        emitter.status(Stage::Planning).await?;
        let intents = self.plan(ctx.query()).await?;
        emitter
            .emit(PipelineEvent::plan_complete(trace_id, intents.clone()))
            .await?;

        emitter.status(Stage::Searching).await?;
        tracing::info!(stage = ?Stage::Searching, "Performing searches");
        let mut outcomes = self
            .dispatcher
            .dispatch_ordered(Arc::clone(&self.agents.searcher), &intents);
        let mut findings = Vec::with_capacity(intents.len());

        for (index, intent) in intents.iter().enumerate() {
            emitter
                .emit(PipelineEvent::search_started(trace_id, index, &intent.query))
                .await?;
            let outcome = outcomes.next().await.unwrap_or(SearchOutcome::Failed);
            emitter
                .emit(PipelineEvent::search_complete(
                    trace_id,
                    index,
                    &intent.query,
                    outcome.findings(),
                ))
                .await?;
            findings.extend(outcome.into_findings());
        }

        if let Some(browser) = self.browser_for(browse) {
            emitter.status(Stage::Browsing).await?;
            findings.extend(self.browse(browser, &intents).await);
        }

        emitter.status(Stage::Writing).await?;
        let report = self.write(ctx.query(), &findings).await?;

        emitter
            .emit(PipelineEvent::complete(Self::response(ctx, report)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::WriterOutput;
    use crate::tools::chart::MockChartRenderer;
    use async_trait::async_trait;

    struct FixedPlanner(Vec<SearchIntent>);

    #[async_trait]
    impl Planner for FixedPlanner {
        async fn plan(&self, _query: &str) -> std::result::Result<Vec<SearchIntent>, AgentError> {
            Ok(self.0.clone())
        }
    }

    struct EchoSearcher;

    #[async_trait]
    impl Searcher for EchoSearcher {
        async fn search(&self, intent: &SearchIntent) -> std::result::Result<String, AgentError> {
            Ok(format!("found {}", intent.query))
        }
    }

    struct FailingWriter;

    #[async_trait]
    impl Writer for FailingWriter {
        async fn write(&self, _input: &str) -> std::result::Result<WriterOutput, AgentError> {
            Err(AgentError::Llm("writer down".to_string()))
        }
    }

    fn pipeline() -> ResearchPipeline {
        let agents = ResearchAgents::new(
            Arc::new(FixedPlanner(vec![SearchIntent::new("a", "r")])),
            Arc::new(EchoSearcher),
            Arc::new(FailingWriter),
            Arc::new(MockChartRenderer::new()),
        );
        ResearchPipeline::new(agents, PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let err = pipeline().run(&ResearchRequest::new("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        assert!(Arc::new(pipeline()).stream(ResearchRequest::new("")).is_err());
    }

    #[tokio::test]
    async fn test_writer_failure_is_fatal_in_batch_mode() {
        let err = pipeline().run(&ResearchRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, AppError::Agent(AgentError::Llm(_))));
    }

    #[tokio::test]
    async fn test_browse_without_browser_is_skipped() {
        let pipeline = pipeline();
        assert!(pipeline.browser_for(Some(true)).is_none());
        assert!(pipeline.browser_for(None).is_none());
    }
}
