//! Research orchestration
//!
//! The core of Delve: given a query, plan searches, run them concurrently,
//! optionally browse the pages the planner pointed at, write a report and
//! embed its charts.
//!
//! - [`Dispatcher`] fans search and browse calls out and filters failures
//! - [`ReportSynthesizer`] makes the single writer call
//! - [`PlaceholderResolver`] swaps `{{token}}` markers for chart images
//! - [`ResearchPipeline`] sequences the stages in batch or streaming mode
//!
//! Every run gets a [`RunContext`] whose tracing span tags all log lines with
//! the run's `trace_id`.

pub mod context;
pub mod dispatcher;
pub mod events;
pub mod pipeline;
pub mod resolver;
pub mod synthesizer;

pub use context::RunContext;
pub use dispatcher::Dispatcher;
pub use events::{PipelineEvent, Stage};
pub use pipeline::{EventStream, ResearchAgents, ResearchPipeline};
pub use resolver::PlaceholderResolver;
pub use synthesizer::ReportSynthesizer;
