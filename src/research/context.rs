use chrono::{DateTime, Utc};
use tracing::Span;
use uuid::Uuid;

/// Per-run identity, created once when a research request arrives.
///
/// Carries the tracing span every stage of the run is instrumented with, so
/// log lines from concurrent runs can be told apart by `trace_id`.
#[derive(Debug, Clone)]
pub struct RunContext {
    trace_id: String,
    query: String,
    started_at: DateTime<Utc>,
    span: Span,
}

impl RunContext {
    pub fn new(query: impl Into<String>) -> Self {
        let trace_id = format!("trace_{}", Uuid::new_v4().simple());
        let span = tracing::info_span!("research", trace_id = %trace_id);

        Self {
            trace_id,
            query: query.into(),
            started_at: Utc::now(),
            span,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique() {
        let a = RunContext::new("q");
        let b = RunContext::new("q");

        assert!(a.trace_id().starts_with("trace_"));
        assert_eq!(a.trace_id().len(), "trace_".len() + 32);
        assert_ne!(a.trace_id(), b.trace_id());
        assert_eq!(a.query(), "q");
        assert!(a.elapsed_ms() >= 0);
    }
}
