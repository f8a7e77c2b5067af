//! Tools used by the research pipeline outside of LLM calls.

/// Chart rendering from writer-supplied tables.
pub mod chart;

pub use chart::{ChartError, ChartRenderer, QuickChartRenderer};
