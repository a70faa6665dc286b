//! Three-stage analysis pipeline

use std::time::Instant;
use uuid::Uuid;

use super::registry::{JobRegistry, JobTransition};
use crate::analysis::StageAdapters;
use crate::config::AnalysisConfig;
use crate::documents::DocumentResolver;
use crate::error::Result;
use crate::types::{AnalysisRequest, AnalysisResult, Stage2Record};

/// Longest prefix of `text` with at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Runs stage 1, document resolution, stage 2 and stage 3 in order
pub struct PipelineExecutor {
    stages: StageAdapters,
    resolver: DocumentResolver,
    config: AnalysisConfig,
}

impl PipelineExecutor {
    pub fn new(stages: StageAdapters, resolver: DocumentResolver, config: AnalysisConfig) -> Self {
        Self {
            stages,
            resolver,
            config,
        }
    }

    pub fn stages(&self) -> &StageAdapters {
        &self.stages
    }

    /// Run the full pipeline; any failure except a missing document is fatal
    pub async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let start = Instant::now();
        let temperature = request.effective_temperature(self.config.default_temperature);
        let document_name = &request.regulation_document_name;

        let stage1 = self.stages.standards_rewrite(request, temperature).await?;
        tracing::info!(
            "Stage 1 complete for {} ({}), quality {}",
            request.organization_id,
            stage1.req_id,
            stage1.quality_rating
        );

        let stage2 = match self
            .resolver
            .resolve(document_name, &request.organization_id)
            .await
        {
            Ok(text) => {
                let text = truncate_chars(&text, self.config.max_regulation_chars);
                let record = self
                    .stages
                    .regulatory_cross_reference(&stage1, text, document_name, temperature)
                    .await?;
                tracing::info!(
                    "Stage 2 complete: {} relevant passages in {}",
                    record.relevant_passages.len(),
                    document_name
                );
                record
            }
            Err(e) if e.is_document_not_found() => {
                tracing::warn!("{}; continuing without regulation text", e);
                Stage2Record::fallback(document_name)
            }
            Err(e) => return Err(e),
        };

        let stage3 = self
            .stages
            .compliance_synthesis(&stage1, &stage2, temperature)
            .await?;
        tracing::info!(
            "Stage 3 complete: {} (quality {}) in {:.1}s",
            stage3.compliance_status,
            stage3.final_quality_rating,
            start.elapsed().as_secs_f64()
        );

        Ok(AnalysisResult::new(
            request.organization_id.clone(),
            stage1,
            stage2,
            stage3,
        ))
    }

    /// Drive one registered job from RUNNING to a terminal state
    pub async fn run_job(
        &self,
        registry: &JobRegistry,
        job_id: Uuid,
        request: &AnalysisRequest,
    ) -> Result<()> {
        registry.transition(job_id, JobTransition::Start)?;
        tracing::info!("Starting analysis job {}", job_id);

        match self.execute(request).await {
            Ok(result) => {
                registry.transition(job_id, JobTransition::Complete(Box::new(result)))?;
                tracing::info!("Job {} completed", job_id);
            }
            Err(e) => {
                tracing::error!("Job {} failed: {}", job_id, e);
                registry.transition(job_id, JobTransition::Fail(e.to_string()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("日本語", 1), "日");
        assert_eq!(truncate_chars("", 0), "");
    }
}
