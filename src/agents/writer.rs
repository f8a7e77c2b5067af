use super::{json::parse_structured, AgentError, Writer, WriterOutput};
use crate::llm::LLMClient;
use async_trait::async_trait;

const WRITER_PROMPT: &str = r#"You are a senior researcher tasked with writing a cohesive report for a research query. You will be provided with the original query and some initial research done by a research assistant.

First come up with an outline that describes the structure and flow of the report. Then write the report in markdown. It should be lengthy and detailed: aim for 5-10 pages of content, at least 1000 words.

Where numbers support the narrative, illustrate them with charts:
1. Put a placeholder such as {{chart_1}}, {{chart_2}} on its own line where the chart belongs.
2. For every placeholder add an entry to "visualization_requests" with:
   - "chart_type": bar, line, pie, doughnut or scatter
   - "title": the chart title
   - "data": a markdown table whose first column holds labels and second column numeric values
   - "description": what the chart shows
   - "position": the matching placeholder, e.g. "{{chart_1}}"

Respond ONLY with valid JSON in this shape:
{"short_summary": "2-3 sentence summary", "markdown_report": "...", "follow_up_questions": ["..."], "visualization_requests": [...]}"#;

/// Writes the final report with an LLM.
pub struct LlmWriter {
    llm: Box<dyn LLMClient>,
    system_prompt: String,
}

impl LlmWriter {
    pub fn new(llm: Box<dyn LLMClient>) -> Self {
        Self {
            llm,
            system_prompt: WRITER_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl Writer for LlmWriter {
    async fn write(&self, input: &str) -> Result<WriterOutput, AgentError> {
        let response = self
            .llm
            .generate_with_system(&self.system_prompt, input)
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        let output: WriterOutput = parse_structured("writer", &response)?;
        if output.markdown_report.trim().is_empty() {
            return Err(AgentError::MalformedOutput {
                agent: "writer",
                reason: "markdown_report is empty".to_string(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Result;

    struct CannedLLM(&'static str);

    #[async_trait]
    impl LLMClient for CannedLLM {
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_write_parses_report() {
        let writer = LlmWriter::new(Box::new(CannedLLM(
            r##"{"short_summary": "Prices rose.", "markdown_report": "# Report\n\n{{chart_1}}",
                "follow_up_questions": ["What about storage?"],
                "visualization_requests": [{"chart_type": "line", "title": "Price",
                  "data": "| Year | USD |\n|---|---|\n| 2023 | 0.3 |", "description": "",
                  "position": "{{chart_1}}"}]}"##,
        )));

        let output = writer.write("Original query: q").await.unwrap();
        assert_eq!(output.short_summary, "Prices rose.");
        assert_eq!(output.follow_up_questions, vec!["What about storage?"]);
        assert_eq!(output.visualization_requests[0].position, "{{chart_1}}");
    }

    #[tokio::test]
    async fn test_empty_report_is_rejected() {
        let writer = LlmWriter::new(Box::new(CannedLLM(
            r#"{"short_summary": "s", "markdown_report": "  "}"#,
        )));
        let err = writer.write("q").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedOutput { agent: "writer", .. }));
    }
}
