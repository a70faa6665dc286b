//! Regulation document lookup for the compliance stage

use std::sync::Arc;

use super::naming::namespace_for;
use crate::error::{Error, Result};
use crate::providers::{ObjectStore, TextExtractor};

const CANDIDATE_EXTENSIONS: [&str; 2] = [".pdf", ".PDF"];

/// Finds an organization's regulation document and extracts its text
pub struct DocumentResolver {
    store: Arc<dyn ObjectStore>,
    extractor: Arc<dyn TextExtractor>,
    namespace_suffix: String,
}

impl DocumentResolver {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
        namespace_suffix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            extractor,
            namespace_suffix: namespace_suffix.into(),
        }
    }

    /// Namespace for an organization
    pub fn namespace(&self, organization_id: &str) -> String {
        namespace_for(organization_id, &self.namespace_suffix)
    }

    /// Object names tried for a document, in lookup order
    pub fn candidate_names(document_name: &str) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::with_capacity(CANDIDATE_EXTENSIONS.len());
        for ext in CANDIDATE_EXTENSIONS {
            let candidate = if document_name.ends_with(ext) {
                document_name.to_string()
            } else {
                format!("{}{}", document_name, ext)
            };
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// Return the text of the first matching object
    ///
    /// `Error::DocumentNotFound` when no candidate exists; storage failures
    /// are returned as they are.
    pub async fn resolve(&self, document_name: &str, organization_id: &str) -> Result<String> {
        let namespace = self.namespace(organization_id);

        for candidate in Self::candidate_names(document_name) {
            if !self.store.exists(&namespace, &candidate).await? {
                continue;
            }

            let data = self.store.read(&namespace, &candidate).await?;
            let text = self.extractor.extract_text(&data).await;
            tracing::info!(
                "Resolved {}/{} ({} bytes, {} chars of text)",
                namespace,
                candidate,
                data.len(),
                text.chars().count()
            );
            return Ok(text);
        }

        Err(Error::DocumentNotFound(format!(
            "{} in {}",
            document_name, namespace
        )))
    }
}
