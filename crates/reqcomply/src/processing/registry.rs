//! In-memory job registry with a forward-only state machine

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::AnalysisResult;

/// Job lifecycle state
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobState {
    /// DONE and FAILED never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }

    /// Legal moves: QUEUED→RUNNING, RUNNING→DONE, RUNNING→FAILED, QUEUED→FAILED
    pub fn can_transition_to(self, to: JobState) -> bool {
        matches!(
            (self, to),
            (JobState::Queued, JobState::Running)
                | (JobState::Running, JobState::Done)
                | (JobState::Running, JobState::Failed)
                | (JobState::Queued, JobState::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Queued => "QUEUED",
            JobState::Running => "RUNNING",
            JobState::Done => "DONE",
            JobState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Snapshot of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub state: JobState,
    pub organization_id: String,
    pub document_name: String,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Present only in DONE
    pub result: Option<AnalysisResult>,
    /// Present only in FAILED
    pub error: Option<String>,
}

/// A requested state change together with its payload
#[derive(Debug, Clone)]
pub enum JobTransition {
    Start,
    Complete(Box<AnalysisResult>),
    Fail(String),
}

impl JobTransition {
    pub fn target(&self) -> JobState {
        match self {
            JobTransition::Start => JobState::Running,
            JobTransition::Complete(_) => JobState::Done,
            JobTransition::Fail(_) => JobState::Failed,
        }
    }
}

/// Job counts per state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

/// Owner of every job record
///
/// Writes go through `DashMap::get_mut`, so a reader never sees a record
/// whose state and payload disagree.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<Uuid, JobRecord>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh QUEUED record and return its id
    pub fn create(&self, organization_id: &str, document_name: &str) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if let Entry::Vacant(slot) = self.jobs.entry(id) {
                slot.insert(JobRecord {
                    id,
                    state: JobState::Queued,
                    organization_id: organization_id.to_string(),
                    document_name: document_name.to_string(),
                    submitted_at: Utc::now(),
                    started_at: None,
                    completed_at: None,
                    result: None,
                    error: None,
                });
                return id;
            }
        }
    }

    /// Apply a transition and its payload in one step
    pub fn transition(&self, job_id: Uuid, transition: JobTransition) -> Result<()> {
        let mut record = self
            .jobs
            .get_mut(&job_id)
            .ok_or(Error::JobNotFound(job_id))?;

        let from = record.state;
        let to = transition.target();
        if !from.can_transition_to(to) {
            drop(record);
            debug_assert!(false, "illegal job transition for {}: {} -> {}", job_id, from, to);
            return Err(Error::InvalidTransition { job_id, from, to });
        }

        let now = Utc::now();
        record.state = to;
        match transition {
            JobTransition::Start => record.started_at = Some(now),
            JobTransition::Complete(result) => {
                record.result = Some(*result);
                record.completed_at = Some(now);
            }
            JobTransition::Fail(message) => {
                record.error = Some(message);
                record.completed_at = Some(now);
            }
        }

        tracing::debug!("Job {}: {} -> {}", job_id, from, to);
        Ok(())
    }

    /// Cloned snapshot of a record
    pub fn get(&self, job_id: Uuid) -> Result<JobRecord> {
        self.jobs
            .get(&job_id)
            .map(|r| r.value().clone())
            .ok_or(Error::JobNotFound(job_id))
    }

    /// All records, oldest submission first
    pub fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.jobs.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.submitted_at);
        records
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for entry in self.jobs.iter() {
            stats.total += 1;
            match entry.state {
                JobState::Queued => stats.queued += 1,
                JobState::Running => stats.running += 1,
                JobState::Done => stats.done += 1,
                JobState::Failed => stats.failed += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComplianceStatus, Score, Stage1Record, Stage2Record, Stage3Record};

    fn sample_result() -> AnalysisResult {
        let score = Score::new(7).unwrap();
        let stage1 = Stage1Record {
            req_id: "REQ-1".to_string(),
            original_requirement: "r".to_string(),
            incose_format: "i".to_string(),
            ears_format: "e".to_string(),
            incose_violations: vec![],
            ears_violations: vec![],
            requirement_pattern: "performance".to_string(),
            quality_rating: score,
            feedback: String::new(),
            analysis_timestamp: Utc::now(),
        };
        let stage3 = Stage3Record {
            final_requirement_ears: "e".to_string(),
            final_requirement_incose: "i".to_string(),
            compliance_status: ComplianceStatus::Partial,
            identified_conflicts: vec![],
            resolution_strategies: vec![],
            compliance_recommendations: vec![],
            regulatory_traceability: vec![],
            final_quality_rating: score,
            enhancement_summary: String::new(),
            analysis_timestamp: Utc::now(),
        };
        AnalysisResult::new("acme", stage1, Stage2Record::fallback("x"), stage3)
    }

    #[test]
    fn test_create_is_queued() {
        let registry = JobRegistry::new();
        let id = registry.create("acme", "gdpr");

        let record = registry.get(id).unwrap();
        assert_eq!(record.state, JobState::Queued);
        assert_eq!(record.organization_id, "acme");
        assert!(record.result.is_none() && record.error.is_none());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_happy_path() {
        let registry = JobRegistry::new();
        let id = registry.create("acme", "gdpr");

        registry.transition(id, JobTransition::Start).unwrap();
        let running = registry.get(id).unwrap();
        assert_eq!(running.state, JobState::Running);
        assert!(running.started_at.is_some());

        registry
            .transition(id, JobTransition::Complete(Box::new(sample_result())))
            .unwrap();
        let done = registry.get(id).unwrap();
        assert_eq!(done.state, JobState::Done);
        assert!(done.result.is_some());
        assert!(done.error.is_none());
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_fail_from_queued_and_running() {
        let registry = JobRegistry::new();

        let queued = registry.create("acme", "gdpr");
        registry
            .transition(queued, JobTransition::Fail("worker unavailable".to_string()))
            .unwrap();
        assert_eq!(registry.get(queued).unwrap().state, JobState::Failed);

        let running = registry.create("acme", "gdpr");
        registry.transition(running, JobTransition::Start).unwrap();
        registry
            .transition(running, JobTransition::Fail("boom".to_string()))
            .unwrap();
        let record = registry.get(running).unwrap();
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.result.is_none());
    }

    #[test]
    fn test_unknown_job() {
        let registry = JobRegistry::new();
        let id = Uuid::new_v4();
        assert!(matches!(registry.get(id), Err(Error::JobNotFound(x)) if x == id));
        assert!(matches!(
            registry.transition(id, JobTransition::Start),
            Err(Error::JobNotFound(_))
        ));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "illegal job transition"))]
    fn test_terminal_state_is_final() {
        let registry = JobRegistry::new();
        let id = registry.create("acme", "gdpr");
        registry.transition(id, JobTransition::Start).unwrap();
        registry
            .transition(id, JobTransition::Fail("boom".to_string()))
            .unwrap();

        let err = registry.transition(id, JobTransition::Start).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: JobState::Failed,
                to: JobState::Running,
                ..
            }
        ));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "illegal job transition"))]
    fn test_queued_cannot_complete() {
        let registry = JobRegistry::new();
        let id = registry.create("acme", "gdpr");
        let result = registry.transition(id, JobTransition::Complete(Box::new(sample_result())));
        assert!(result.is_err());
        assert_eq!(registry.get(id).unwrap().state, JobState::Queued);
    }

    #[test]
    fn test_transition_table() {
        use JobState::*;
        assert!(Queued.can_transition_to(Running));
        assert!(Queued.can_transition_to(Failed));
        assert!(Running.can_transition_to(Done));
        assert!(Running.can_transition_to(Failed));
        assert!(!Queued.can_transition_to(Done));
        assert!(!Running.can_transition_to(Queued));
        for terminal in [Done, Failed] {
            assert!(terminal.is_terminal());
            for to in [Queued, Running, Done, Failed] {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_list_and_stats() {
        let registry = JobRegistry::new();
        let a = registry.create("acme", "a");
        let b = registry.create("acme", "b");
        registry.create("acme", "c");
        registry.transition(a, JobTransition::Start).unwrap();
        registry.transition(b, JobTransition::Start).unwrap();
        registry
            .transition(b, JobTransition::Fail("x".to_string()))
            .unwrap();

        assert_eq!(registry.list().len(), 3);
        assert_eq!(
            registry.stats(),
            RegistryStats {
                total: 3,
                queued: 1,
                running: 1,
                done: 0,
                failed: 1,
            }
        );
    }
}
