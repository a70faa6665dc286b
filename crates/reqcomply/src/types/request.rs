//! Analysis request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest organization id that still yields a valid bucket name
/// once "-requirements" is appended (63 - 13).
pub const MAX_ORGANIZATION_ID_LEN: usize = 50;

/// Request to analyze one requirement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Organization scoping key for document lookup
    #[serde(rename = "organizationId", alias = "organization_id")]
    pub organization_id: String,
    /// Free-text requirement
    #[serde(alias = "requirement_text")]
    pub original_requirement: String,
    /// Logical name of the regulation document
    #[serde(alias = "document_name")]
    pub regulation_document_name: String,
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub req_id: String,
    /// Sampling temperature in [0, 1] (default: 0.1)
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl AnalysisRequest {
    /// Create a request with only the required fields
    pub fn new(
        organization_id: impl Into<String>,
        original_requirement: impl Into<String>,
        regulation_document_name: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            original_requirement: original_requirement.into(),
            regulation_document_name: regulation_document_name.into(),
            system_name: String::new(),
            objective: String::new(),
            req_id: String::new(),
            temperature: None,
        }
    }

    pub fn with_system_name(mut self, system_name: impl Into<String>) -> Self {
        self.system_name = system_name.into();
        self
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn with_req_id(mut self, req_id: impl Into<String>) -> Self {
        self.req_id = req_id.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Temperature to use, falling back to the configured default
    pub fn effective_temperature(&self, default: f32) -> f32 {
        self.temperature.unwrap_or(default)
    }

    /// Reject malformed input before any stage runs
    pub fn validate(&self) -> Result<()> {
        validate_organization_id(&self.organization_id)?;

        if self.original_requirement.trim().is_empty() {
            return Err(Error::validation("original_requirement must not be empty"));
        }
        if self.regulation_document_name.trim().is_empty() {
            return Err(Error::validation("regulation_document_name must not be empty"));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(Error::validation(format!(
                    "temperature must be within [0, 1], got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

/// Organization ids become part of a storage container name, so they are
/// limited to lowercase alphanumerics, '-' and '_', starting and ending with
/// an alphanumeric.
pub fn validate_organization_id(organization_id: &str) -> Result<()> {
    if organization_id.is_empty() {
        return Err(Error::validation("organizationId must not be empty"));
    }
    if organization_id.len() > MAX_ORGANIZATION_ID_LEN {
        return Err(Error::validation(format!(
            "organizationId must be at most {} characters",
            MAX_ORGANIZATION_ID_LEN
        )));
    }

    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';
    if !organization_id.chars().all(allowed) {
        return Err(Error::validation(format!(
            "organizationId '{}' may only contain lowercase letters, digits, '-' and '_'",
            organization_id
        )));
    }

    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !alnum(organization_id.chars().next()) || !alnum(organization_id.chars().last()) {
        return Err(Error::validation(
            "organizationId must start and end with a letter or digit",
        ));
    }
    Ok(())
}
