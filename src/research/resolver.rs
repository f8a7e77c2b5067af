//! Chart placeholder resolution
//!
//! Replaces each requested placeholder in the report body with a rendered
//! image link. A chart that fails to render leaves its placeholder in place.

use crate::tools::chart::{ChartError, ChartRenderer};
use crate::types::{Report, VisualizationRequest};
use std::sync::Arc;
use std::time::Duration;

/// Substitutes rendered charts for the `{{token}}` markers in a report body.
pub struct PlaceholderResolver {
    renderer: Arc<dyn ChartRenderer>,
    timeout: Option<Duration>,
}

impl PlaceholderResolver {
    pub fn new(renderer: Arc<dyn ChartRenderer>, timeout: Option<Duration>) -> Self {
        Self { renderer, timeout }
    }

    async fn render(&self, request: &VisualizationRequest) -> Result<String, ChartError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.renderer.render(request))
                .await
                .unwrap_or(Err(ChartError::Timeout(limit.as_secs()))),
            None => self.renderer.render(request).await,
        }
    }

    /// Resolve every visualization request in order and return how many
    /// placeholders were replaced.
    ///
    /// A failed render leaves its marker in place. Running this twice is a
    /// no-op the second time, since resolved markers are gone from the body.
    pub async fn resolve(&self, report: &mut Report) -> usize {
        let mut resolved = 0;

        for request in &report.visualization_requests {
            let placeholder = request.placeholder();
            if !report.body.contains(&placeholder) {
                tracing::warn!(%placeholder, "Placeholder not found in report body");
                continue;
            }

            match self.render(request).await {
                Ok(url) => {
                    let image = format!("![{}]({})", request.title, url);
                    report.body = report.body.replace(&placeholder, &image);
                    resolved += 1;
                    tracing::debug!(%placeholder, "Chart embedded");
                }
                Err(e) => {
                    tracing::warn!(%placeholder, error = %e, "Chart rendering failed, keeping placeholder");
                }
            }
        }

        resolved
    }
}
