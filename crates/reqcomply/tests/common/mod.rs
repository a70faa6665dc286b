//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use reqcomply::config::AppConfig;
use reqcomply::processing::{JobRecord, Orchestrator};
use reqcomply::providers::{
    GenerationRequest, LlmProvider, MemoryObjectStore, ObjectInfo, ObjectStore,
    PlainTextExtractor,
};
use reqcomply::{AppState, Error, Result};
use uuid::Uuid;

pub const STAGE1_REPLY: &str = r#"```json
{
    "req_id": "REQ-1",
    "original_requirement": "The portal shall encrypt personal data",
    "incose_format": "The portal shall encrypt all stored personal data.",
    "ears_format": "While storing personal data, the portal shall encrypt it.",
    "incose_violations": [],
    "ears_violations": ["Missing state condition"],
    "requirement_pattern": "functional",
    "quality_rating": 6,
    "feedback": "State the encryption standard."
}
```"#;

pub const STAGE2_REPLY: &str = r#"{
    "regulation_document": "gdpr",
    "relevant_passages": [
        {"section": "Art. 32", "text": "encryption of personal data", "relevance_score": "9/10", "impact": "mandates encryption"}
    ],
    "compliance_concerns": ["Key management is unspecified"],
    "regulatory_keywords": ["encryption", "personal data"]
}"#;

pub const STAGE3_REPLY: &str = r#"{
    "final_requirement_ears": "While storing personal data, the portal shall encrypt it with AES-256.",
    "final_requirement_incose": "The portal shall encrypt stored personal data with AES-256.",
    "compliance_status": "COMPLIANT",
    "identified_conflicts": [],
    "resolution_strategies": [],
    "compliance_recommendations": ["Document key rotation"],
    "regulatory_traceability": ["GDPR Art. 32"],
    "final_quality_rating": 9,
    "enhancement_summary": "Named the cipher and tied the requirement to Art. 32."
}"#;

/// What the scripted provider does when a given stage is prompted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Reply,
    Fail,
    Garbage,
    Panic,
}

/// Answers each stage prompt with a canned reply or a scripted failure
pub struct ScriptedLlm {
    behaviors: [Behavior; 3],
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            behaviors: [Behavior::Reply; 3],
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Stage numbers are 1-based
    pub fn on_stage(mut self, stage: usize, behavior: Behavior) -> Self {
        self.behaviors[stage - 1] = behavior;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls_for_stage(&self, stage: usize) -> usize {
        self.prompts
            .lock()
            .iter()
            .filter(|p| stage_of(p) == Some(stage))
            .count()
    }
}

fn stage_of(prompt: &str) -> Option<usize> {
    if prompt.starts_with("As a requirements engineering expert") {
        Some(1)
    } else if prompt.starts_with("As a regulatory compliance expert") {
        Some(2)
    } else if prompt.starts_with("As a systems engineering expert") {
        Some(3)
    } else {
        None
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.prompts.lock().push(request.prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let stage = stage_of(&request.prompt)
            .ok_or_else(|| Error::provider("unrecognized prompt"))?;

        match self.behaviors[stage - 1] {
            Behavior::Reply => Ok(match stage {
                1 => STAGE1_REPLY,
                2 => STAGE2_REPLY,
                _ => STAGE3_REPLY,
            }
            .to_string()),
            Behavior::Fail => Err(Error::provider(format!("stage {} quota exceeded", stage))),
            Behavior::Garbage => Ok("I'm sorry, I can't produce JSON today.".to_string()),
            Behavior::Panic => panic!("scripted panic in stage {}", stage),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

/// Object store whose backend is unreachable
pub struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn exists(&self, _namespace: &str, _name: &str) -> Result<bool> {
        Err(Error::storage("unreachable"))
    }

    async fn read(&self, _namespace: &str, _name: &str) -> Result<Vec<u8>> {
        Err(Error::storage("unreachable"))
    }

    async fn write(
        &self,
        _namespace: &str,
        _name: &str,
        _data: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        Err(Error::storage("unreachable"))
    }

    async fn list(&self, _namespace: &str) -> Result<Vec<ObjectInfo>> {
        Err(Error::storage("unreachable"))
    }

    async fn delete(&self, _namespace: &str, _name: &str) -> Result<()> {
        Err(Error::storage("unreachable"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Default-config state over any store
pub fn state_with_store(llm: Arc<ScriptedLlm>, store: Arc<dyn ObjectStore>) -> AppState {
    AppState::from_parts(
        AppConfig::default(),
        llm,
        store,
        Arc::new(PlainTextExtractor),
    )
}

pub struct Harness {
    pub state: AppState,
    pub llm: Arc<ScriptedLlm>,
    pub store: Arc<MemoryObjectStore>,
}

impl Harness {
    pub fn new(llm: ScriptedLlm) -> Self {
        Self::with_config(llm, AppConfig::default())
    }

    pub fn with_config(llm: ScriptedLlm, config: AppConfig) -> Self {
        let llm = Arc::new(llm);
        let store = Arc::new(MemoryObjectStore::new());
        let state = AppState::from_parts(
            config,
            llm.clone(),
            store.clone(),
            Arc::new(PlainTextExtractor),
        );
        Self { state, llm, store }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        self.state.orchestrator()
    }

    /// Store a plain-text "regulation" where the resolver will find it
    pub async fn seed_document(&self, organization_id: &str, name: &str, text: &str) {
        let namespace = format!("{}-requirements", organization_id);
        self.store
            .write(&namespace, name, text.as_bytes(), "application/pdf")
            .await
            .unwrap();
    }
}

/// Poll until the job is DONE or FAILED
pub async fn wait_terminal(orchestrator: &Orchestrator, job_id: Uuid) -> JobRecord {
    for _ in 0..500 {
        let record = orchestrator.get_status(job_id).unwrap();
        if record.state.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish in time", job_id);
}
