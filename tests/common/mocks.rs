//! Hand-written fakes for the research agent traits.
//!
//! Each fake records what it was called with so tests can assert on call
//! counts and inputs without touching a network or a model.

use async_trait::async_trait;
use delve::agents::{
    AgentError, BrowserExplorer, ChartRequest, Planner, Searcher, Writer, WriterOutput,
};
use delve::research::ResearchAgents;
use delve::tools::chart::{ChartError, ChartRenderer};
use delve::types::{SearchIntent, VisualizationRequest};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============= Planner =============

/// Returns a fixed plan, or fails.
pub struct MockPlanner {
    intents: Vec<SearchIntent>,
    fail: bool,
}

impl MockPlanner {
    pub fn new(intents: Vec<SearchIntent>) -> Self {
        Self {
            intents,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            intents: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Planner for MockPlanner {
    async fn plan(&self, _query: &str) -> Result<Vec<SearchIntent>, AgentError> {
        if self.fail {
            return Err(AgentError::Llm("planner unavailable".to_string()));
        }
        Ok(self.intents.clone())
    }
}

// ============= Searcher =============

/// Answers `"findings: <query>"`, failing or sleeping for configured queries.
#[derive(Default)]
pub struct MockSearcher {
    failing: HashSet<String>,
    delays: Vec<(String, Duration)>,
    calls: AtomicUsize,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn delayed(mut self, query: &str, delay: Duration) -> Self {
        self.delays.push((query.to_string(), delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    async fn search(&self, intent: &SearchIntent) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some((_, delay)) = self.delays.iter().find(|(q, _)| *q == intent.query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&intent.query) {
            return Err(AgentError::Search(format!("no results for {}", intent.query)));
        }
        Ok(format!("findings: {}", intent.query))
    }
}

// ============= Browser =============

/// Returns `"page: <url>"` for hinted intents.
#[derive(Default)]
pub struct MockBrowser {
    calls: AtomicUsize,
}

impl MockBrowser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserExplorer for MockBrowser {
    async fn explore(&self, intent: &SearchIntent) -> Result<Option<String>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(intent.source_hint.as_ref().map(|url| format!("page: {}", url)))
    }
}

// ============= Writer =============

/// Returns a canned report and records every input it receives.
pub struct MockWriter {
    output: Option<WriterOutput>,
    inputs: Mutex<Vec<String>>,
}

impl MockWriter {
    pub fn new(output: WriterOutput) -> Self {
        Self {
            output: Some(output),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            output: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Writer for MockWriter {
    async fn write(&self, input: &str) -> Result<WriterOutput, AgentError> {
        self.inputs.lock().unwrap().push(input.to_string());
        self.output.clone().ok_or_else(|| AgentError::MalformedOutput {
            agent: "writer",
            reason: "not JSON".to_string(),
        })
    }
}

/// A writer output with one chart request per token.
pub fn report_with_charts(body: &str, tokens: &[&str]) -> WriterOutput {
    WriterOutput {
        short_summary: "Tariffs raised installed costs.".to_string(),
        markdown_report: body.to_string(),
        follow_up_questions: vec!["How did storage prices move?".to_string()],
        visualization_requests: tokens
            .iter()
            .map(|token| ChartRequest {
                chart_type: "bar".to_string(),
                title: format!("Chart {}", token),
                data: "| Year | Price |\n|---|---|\n| 2023 | 0.31 |".to_string(),
                description: String::new(),
                position: format!("{{{{{}}}}}", token),
            })
            .collect(),
    }
}

// ============= Chart renderer =============

/// Renders `https://charts.test/<token>.png`, failing or panicking for configured tokens.
#[derive(Default)]
pub struct MockRenderer {
    failing: HashSet<String>,
    panicking: HashSet<String>,
}

impl MockRenderer {
    pub fn failing_on(mut self, token: &str) -> Self {
        self.failing.insert(token.to_string());
        self
    }

    pub fn panicking_on(mut self, token: &str) -> Self {
        self.panicking.insert(token.to_string());
        self
    }
}

#[async_trait]
impl ChartRenderer for MockRenderer {
    async fn render(&self, request: &VisualizationRequest) -> Result<String, ChartError> {
        if self.panicking.contains(&request.placeholder_token) {
            panic!("renderer bug on {}", request.placeholder_token);
        }
        if self.failing.contains(&request.placeholder_token) {
            return Err(ChartError::NoNumericColumn("Year, Label".to_string()));
        }
        Ok(format!("https://charts.test/{}.png", request.placeholder_token))
    }
}

// ============= Assembly =============

pub fn agents(
    planner: MockPlanner,
    searcher: Arc<MockSearcher>,
    writer: Arc<MockWriter>,
    renderer: MockRenderer,
) -> ResearchAgents {
    ResearchAgents::new(Arc::new(planner), searcher, writer, Arc::new(renderer))
}

pub fn intents(queries: &[&str]) -> Vec<SearchIntent> {
    queries
        .iter()
        .map(|q| SearchIntent::new(*q, format!("to learn about {}", q)))
        .collect()
}
