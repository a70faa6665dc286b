//! Stage adapters: prompt, single model call, decode

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::decode::decode;
use super::prompt::PromptBuilder;
use crate::error::Result;
use crate::providers::{GenerationRequest, LlmProvider};
use crate::types::{AnalysisRequest, Stage1Record, Stage2Record, Stage3Record};

pub const STAGE1: &str = "stage1";
pub const STAGE2: &str = "stage2";
pub const STAGE3: &str = "stage3";

/// The three model-backed analysis steps
///
/// Each adapter calls the provider exactly once; retry policy lives in the
/// provider.
pub struct StageAdapters {
    llm: Arc<dyn LlmProvider>,
}

impl StageAdapters {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Provider used by every stage
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    async fn call(&self, stage: &'static str, prompt: String, temperature: f32) -> Result<String> {
        tracing::debug!(
            "{} prompt: {} chars via {}/{}",
            stage,
            prompt.len(),
            self.llm.name(),
            self.llm.model()
        );

        let text = self
            .llm
            .generate(&GenerationRequest::json(prompt, temperature))
            .await?;

        tracing::debug!("{} response: {} chars", stage, text.len());
        Ok(text)
    }

    /// Stage 1: INCOSE/EARS standards rewrite
    pub async fn standards_rewrite(
        &self,
        request: &AnalysisRequest,
        temperature: f32,
    ) -> Result<Stage1Record> {
        let prompt = PromptBuilder::standards_rewrite(request);
        let text = self.call(STAGE1, prompt, temperature).await?;

        let mut record: Stage1Record = decode(STAGE1, &text)?;
        if record.req_id.trim().is_empty() {
            record.req_id = if request.req_id.trim().is_empty() {
                generated_req_id()
            } else {
                request.req_id.clone()
            };
        }
        if record.original_requirement.trim().is_empty() {
            record.original_requirement = request.original_requirement.clone();
        }
        record.analysis_timestamp = Utc::now();
        Ok(record)
    }

    /// Stage 2: cross-reference the requirement with regulation text
    pub async fn regulatory_cross_reference(
        &self,
        stage1: &Stage1Record,
        regulation_text: &str,
        document_name: &str,
        temperature: f32,
    ) -> Result<Stage2Record> {
        let prompt =
            PromptBuilder::regulatory_cross_reference(stage1, regulation_text, document_name)?;
        let text = self.call(STAGE2, prompt, temperature).await?;

        let mut record: Stage2Record = decode(STAGE2, &text)?;
        if record.regulation_document.trim().is_empty() {
            record.regulation_document = document_name.to_string();
        }
        record.analysis_timestamp = Utc::now();
        Ok(record)
    }

    /// Stage 3: synthesize the compliant final requirement
    pub async fn compliance_synthesis(
        &self,
        stage1: &Stage1Record,
        stage2: &Stage2Record,
        temperature: f32,
    ) -> Result<Stage3Record> {
        let prompt = PromptBuilder::compliance_synthesis(stage1, stage2)?;
        let text = self.call(STAGE3, prompt, temperature).await?;

        let mut record: Stage3Record = decode(STAGE3, &text)?;
        record.analysis_timestamp = Utc::now();
        Ok(record)
    }
}

fn generated_req_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("REQ-{}", id[..8].to_uppercase())
}
