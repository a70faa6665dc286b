//! Stage records produced by the analysis pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Concern recorded when no regulation document resolves
pub const NO_REGULATION_CONCERN: &str = "No regulation document found for analysis";

/// A 1-10 rating emitted by the model
///
/// Models are inconsistent about the encoding: `8`, `"8"`, `8.0` and `"8/10"`
/// all occur. Fractional values round to the nearest integer. Anything outside
/// 1..=10 fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Build a score, rejecting out-of-range values
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let rounded = value.round();
        if rounded < f64::from(Self::MIN) || rounded > f64::from(Self::MAX) {
            return None;
        }
        Some(Self(rounded as u8))
    }

    fn parse_text(text: &str) -> Option<Self> {
        let text = text.trim();
        // "8/10" style
        let head = match text.split_once('/') {
            Some((head, tail)) if tail.trim() == "10" => head.trim(),
            Some(_) => return None,
            None => text,
        };
        head.parse::<f64>().ok().and_then(Self::from_f64)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawScore {
            Int(i64),
            Float(f64),
            Text(String),
        }

        let parsed = match RawScore::deserialize(deserializer)? {
            RawScore::Int(v) => u8::try_from(v).ok().and_then(Score::new),
            RawScore::Float(v) => Score::from_f64(v),
            RawScore::Text(s) => Score::parse_text(&s),
        };

        parsed.ok_or_else(|| serde::de::Error::custom("score must be a number between 1 and 10"))
    }
}

/// Stage 1: standards rewrite (INCOSE + EARS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage1Record {
    #[serde(default)]
    pub req_id: String,
    #[serde(default)]
    pub original_requirement: String,
    pub incose_format: String,
    pub ears_format: String,
    /// Required, may be empty
    pub incose_violations: Vec<String>,
    /// Required, may be empty
    pub ears_violations: Vec<String>,
    #[serde(default)]
    pub requirement_pattern: String,
    pub quality_rating: Score,
    /// Required, may be empty
    pub feedback: String,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub analysis_timestamp: DateTime<Utc>,
}

/// A regulation excerpt judged relevant to the requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantPassage {
    pub section: String,
    pub text: String,
    pub relevance_score: Score,
    pub impact: String,
}

/// Stage 2: regulatory cross-reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage2Record {
    #[serde(default)]
    pub regulation_document: String,
    pub relevant_passages: Vec<RelevantPassage>,
    pub compliance_concerns: Vec<String>,
    pub regulatory_keywords: Vec<String>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub analysis_timestamp: DateTime<Utc>,
}

impl Stage2Record {
    /// Degraded record used when the regulation document cannot be found
    pub fn fallback(document_name: &str) -> Self {
        Self {
            regulation_document: document_name.to_string(),
            relevant_passages: Vec::new(),
            compliance_concerns: vec![NO_REGULATION_CONCERN.to_string()],
            regulatory_keywords: Vec::new(),
            analysis_timestamp: Utc::now(),
        }
    }

    /// True when this record came from the fallback path
    pub fn is_fallback(&self) -> bool {
        self.relevant_passages.is_empty()
            && self.regulatory_keywords.is_empty()
            && self.compliance_concerns.len() == 1
            && self.compliance_concerns[0] == NO_REGULATION_CONCERN
    }
}

/// Overall compliance verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Partial,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
            ComplianceStatus::Partial => "PARTIAL",
        };
        f.write_str(s)
    }
}

/// Stage 3: compliance synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage3Record {
    pub final_requirement_ears: String,
    pub final_requirement_incose: String,
    pub compliance_status: ComplianceStatus,
    pub identified_conflicts: Vec<String>,
    pub resolution_strategies: Vec<String>,
    pub compliance_recommendations: Vec<String>,
    pub regulatory_traceability: Vec<String>,
    pub final_quality_rating: Score,
    pub enhancement_summary: String,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub analysis_timestamp: DateTime<Utc>,
}

/// Composite result of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Always "success"; failures never produce a result
    pub status: String,
    pub organization_id: String,
    pub stage1: Stage1Record,
    pub stage2: Stage2Record,
    pub stage3: Stage3Record,
    pub processed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(
        organization_id: impl Into<String>,
        stage1: Stage1Record,
        stage2: Stage2Record,
        stage3: Stage3Record,
    ) -> Self {
        Self {
            status: "success".to_string(),
            organization_id: organization_id.into(),
            stage1,
            stage2,
            stage3,
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(json: &str) -> Option<Score> {
        serde_json::from_str::<Score>(json).ok()
    }

    #[test]
    fn test_score_encodings() {
        assert_eq!(score("8").map(Score::value), Some(8));
        assert_eq!(score("\"7\"").map(Score::value), Some(7));
        assert_eq!(score("\"9/10\"").map(Score::value), Some(9));
        assert_eq!(score("6.6").map(Score::value), Some(7));
        assert_eq!(score("\" 10 \"").map(Score::value), Some(10));
    }

    #[test]
    fn test_score_rejects_out_of_range() {
        assert!(score("0").is_none());
        assert!(score("11").is_none());
        assert!(score("-3").is_none());
        assert!(score("\"high\"").is_none());
        assert!(score("\"8/5\"").is_none());
        assert!(score("null").is_none());
    }

    #[test]
    fn test_stage1_requires_violation_lists() {
        let missing = r#"{
            "req_id": "REQ-1",
            "incose_format": "a",
            "ears_format": "b",
            "incose_violations": [],
            "quality_rating": 5,
            "feedback": ""
        }"#;
        assert!(serde_json::from_str::<Stage1Record>(missing).is_err());

        let complete = r#"{
            "req_id": "REQ-1",
            "incose_format": "a",
            "ears_format": "b",
            "incose_violations": [],
            "ears_violations": [],
            "quality_rating": "5",
            "feedback": "",
            "analysis_timestamp": "not a timestamp"
        }"#;
        let record: Stage1Record = serde_json::from_str(complete).unwrap();
        assert!(record.incose_violations.is_empty());
        assert_eq!(record.quality_rating.value(), 5);
    }

    #[test]
    fn test_fallback_record() {
        let record = Stage2Record::fallback("nonexistent");
        assert_eq!(record.regulation_document, "nonexistent");
        assert!(record.relevant_passages.is_empty());
        assert!(record.regulatory_keywords.is_empty());
        assert_eq!(record.compliance_concerns, vec![NO_REGULATION_CONCERN.to_string()]);
        assert!(record.is_fallback());
    }

    #[test]
    fn test_compliance_status_wire_format() {
        let status: ComplianceStatus = serde_json::from_str("\"NON_COMPLIANT\"").unwrap();
        assert_eq!(status, ComplianceStatus::NonCompliant);
        assert_eq!(serde_json::to_string(&ComplianceStatus::Partial).unwrap(), "\"PARTIAL\"");
        assert!(serde_json::from_str::<ComplianceStatus>("\"MOSTLY\"").is_err());
    }
}
