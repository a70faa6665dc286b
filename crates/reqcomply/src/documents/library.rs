//! Per-organization regulation document library

use std::sync::Arc;
use tokio::sync::Mutex;

use super::naming::{namespace_for, secure_filename};
use super::versioning::next_available_name;
use crate::error::{Error, Result};
use crate::providers::{ObjectInfo, ObjectStore};
use crate::types::request::validate_organization_id;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// True when the filename carries a `.pdf` extension (any case)
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Upload, list and delete regulation PDFs in organization namespaces
pub struct DocumentLibrary {
    store: Arc<dyn ObjectStore>,
    namespace_suffix: String,
    // Name selection and write happen as one step per process
    upload_lock: Mutex<()>,
}

impl DocumentLibrary {
    pub fn new(store: Arc<dyn ObjectStore>, namespace_suffix: impl Into<String>) -> Self {
        Self {
            store,
            namespace_suffix: namespace_suffix.into(),
            upload_lock: Mutex::new(()),
        }
    }

    fn namespace(&self, organization_id: &str) -> Result<String> {
        validate_organization_id(organization_id)?;
        Ok(namespace_for(organization_id, &self.namespace_suffix))
    }

    /// Store a PDF under a sanitized, non-colliding name and return that name
    pub async fn upload(&self, organization_id: &str, filename: &str, data: &[u8]) -> Result<String> {
        let namespace = self.namespace(organization_id)?;

        if !is_pdf_filename(filename) {
            return Err(Error::UnsupportedFileType(format!(
                "Only PDF files are allowed. Got: {}",
                filename
            )));
        }

        let secure_name = secure_filename(filename)?;

        let _guard = self.upload_lock.lock().await;
        let final_name = next_available_name(self.store.as_ref(), &namespace, &secure_name).await?;
        self.store
            .write(&namespace, &final_name, data, PDF_CONTENT_TYPE)
            .await?;

        tracing::info!(
            "Uploaded {} to {} ({} bytes)",
            final_name,
            namespace,
            data.len()
        );
        Ok(final_name)
    }

    /// Documents stored for an organization
    pub async fn list(&self, organization_id: &str) -> Result<Vec<ObjectInfo>> {
        let namespace = self.namespace(organization_id)?;
        self.store.list(&namespace).await
    }

    /// Delete one document
    pub async fn delete(&self, organization_id: &str, document_name: &str) -> Result<()> {
        let namespace = self.namespace(organization_id)?;
        self.store.delete(&namespace, document_name).await?;
        tracing::info!("Deleted {} from {}", document_name, namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryObjectStore;

    fn library() -> DocumentLibrary {
        DocumentLibrary::new(Arc::new(MemoryObjectStore::new()), "-requirements")
    }

    #[tokio::test]
    async fn test_upload_versions_duplicates() {
        let library = library();

        let first = library.upload("acme", "ISO 27001.pdf", b"a").await.unwrap();
        let second = library.upload("acme", "ISO 27001.pdf", b"b").await.unwrap();
        let third = library.upload("acme", "ISO 27001.pdf", b"c").await.unwrap();

        assert_eq!(first, "ISO_27001.pdf");
        assert_eq!(second, "ISO_27001(1).pdf");
        assert_eq!(third, "ISO_27001(2).pdf");
        assert_eq!(library.list("acme").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let library = library();
        let err = library.upload("acme", "notes.docx", b"x").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));

        assert!(library.upload("acme", "SCAN.PDF", b"x").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_organization() {
        let library = library();
        assert!(library.list("Bad Org").await.is_err());
        assert!(library.upload("../x", "a.pdf", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let library = library();
        let name = library.upload("acme", "gdpr.pdf", b"x").await.unwrap();

        library.delete("acme", &name).await.unwrap();
        assert!(library.list("acme").await.unwrap().is_empty());

        let err = library.delete("acme", &name).await.unwrap_err();
        assert!(err.is_document_not_found());
    }
}
