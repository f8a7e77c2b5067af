//! Report synthesis
//!
//! One writer call over the query and every surviving finding.

use super::dispatcher::with_timeout;
use crate::agents::{AgentError, ChartRequest, Writer, WriterOutput};
use crate::types::{Report, VisualizationRequest};
use std::sync::Arc;
use std::time::Duration;

/// Build the single request handed to the writer.
pub fn format_synthesis_input(query: &str, findings: &[String]) -> String {
    format!(
        "Original query: {}\nSummarized search results: {:?}",
        query, findings
    )
}

/// Strip whitespace and any `{{ }}` wrapping from a writer-supplied token.
pub fn normalize_token(raw: &str) -> String {
    let token = raw.trim();
    let token = token.strip_prefix("{{").unwrap_or(token);
    let token = token.strip_suffix("}}").unwrap_or(token);
    token.trim().to_string()
}

impl From<ChartRequest> for VisualizationRequest {
    fn from(chart: ChartRequest) -> Self {
        VisualizationRequest {
            kind: chart.chart_type,
            title: chart.title,
            data_payload: chart.data,
            description: chart.description,
            placeholder_token: normalize_token(&chart.position),
        }
    }
}

impl From<WriterOutput> for Report {
    fn from(output: WriterOutput) -> Self {
        Report {
            summary: output.short_summary,
            body: output.markdown_report,
            follow_up_questions: output.follow_up_questions,
            visualization_requests: output
                .visualization_requests
                .into_iter()
                .map(VisualizationRequest::from)
                .collect(),
        }
    }
}

/// Turns findings into a [`Report`] with one writer call.
pub struct ReportSynthesizer {
    writer: Arc<dyn Writer>,
    timeout: Option<Duration>,
}

impl ReportSynthesizer {
    pub fn new(writer: Arc<dyn Writer>, timeout: Option<Duration>) -> Self {
        Self { writer, timeout }
    }

    /// Write the report. Failures are returned as-is; there is no retry.
    pub async fn synthesize(&self, query: &str, findings: &[String]) -> Result<Report, AgentError> {
        if findings.is_empty() {
            tracing::warn!("No search findings; writing report from the query alone");
        }

        let input = format_synthesis_input(query, findings);
        let output = with_timeout("writer", self.timeout, self.writer.write(&input)).await?;
        let report = Report::from(output);

        tracing::info!(
            body_chars = report.body.len(),
            charts = report.visualization_requests.len(),
            follow_ups = report.follow_up_questions.len(),
            "Report written"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        calls: AtomicUsize,
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Writer for RecordingWriter {
        async fn write(&self, input: &str) -> Result<WriterOutput, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(input.to_string());
            Ok(WriterOutput {
                short_summary: "summary".to_string(),
                markdown_report: "# Report\n{{chart_1}}".to_string(),
                follow_up_questions: vec!["next?".to_string()],
                visualization_requests: vec![ChartRequest {
                    chart_type: "bar".to_string(),
                    title: "Prices".to_string(),
                    data: "a,1".to_string(),
                    description: String::new(),
                    position: " {{chart_1}} ".to_string(),
                }],
            })
        }
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("{{chart_1}}"), "chart_1");
        assert_eq!(normalize_token("  chart_2 "), "chart_2");
        assert_eq!(normalize_token("{{ chart_3 }}"), "chart_3");
    }

    #[test]
    fn test_synthesis_input_format() {
        let input = format_synthesis_input("solar", &["one".to_string(), "two".to_string()]);
        assert_eq!(
            input,
            "Original query: solar\nSummarized search results: [\"one\", \"two\"]"
        );
    }

    #[tokio::test]
    async fn test_empty_findings_still_call_writer_once() {
        let writer = Arc::new(RecordingWriter::default());
        let synthesizer = ReportSynthesizer::new(writer.clone(), None);

        let report = synthesizer.synthesize("solar", &[]).await.unwrap();

        assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            writer.inputs.lock().unwrap()[0],
            "Original query: solar\nSummarized search results: []"
        );
        assert_eq!(report.summary, "summary");
        assert_eq!(report.visualization_requests[0].placeholder_token, "chart_1");
    }
}
