//! Local filesystem object store
//!
//! Each namespace is a directory under the configured root.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;

use super::object_store::{ObjectInfo, ObjectStore};
use crate::error::{Error, Result};

/// Object store backed by a directory per namespace
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a new local object store rooted at `root`
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::storage(format!(
                "Failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    fn namespace_dir(&self, namespace: &str) -> Result<PathBuf> {
        check_component("namespace", namespace)?;
        Ok(self.root.join(namespace))
    }

    fn object_path(&self, namespace: &str, name: &str) -> Result<PathBuf> {
        check_component("object name", name)?;
        Ok(self.namespace_dir(namespace)?.join(name))
    }
}

/// Reject anything that could escape the namespace directory
fn check_component(kind: &str, value: &str) -> Result<()> {
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
    {
        return Err(Error::validation(format!("Invalid {}: {:?}", kind, value)));
    }
    Ok(())
}

fn not_found_or_storage(e: std::io::Error, namespace: &str, name: &str) -> Error {
    if e.kind() == ErrorKind::NotFound {
        Error::DocumentNotFound(format!("{}/{}", namespace, name))
    } else {
        Error::storage(format!("{}/{}: {}", namespace, name, e))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        // A name that cannot be stored here is simply absent
        if check_component("object name", name).is_err() {
            return Ok(false);
        }
        let path = self.object_path(namespace, name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!("{}/{}: {}", namespace, name, e))),
        }
    }

    async fn read(&self, namespace: &str, name: &str) -> Result<Vec<u8>> {
        if check_component("object name", name).is_err() {
            return Err(Error::DocumentNotFound(format!("{}/{}", namespace, name)));
        }
        let path = self.object_path(namespace, name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_storage(e, namespace, name))
    }

    async fn write(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        let dir = self.namespace_dir(namespace)?;
        let path = self.object_path(namespace, name)?;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::storage(format!("Failed to create {}: {}", dir.display(), e)))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| Error::storage(format!("Failed to write {}/{}: {}", namespace, name, e)))?;

        tracing::debug!("Stored {}/{} ({} bytes)", namespace, name, data.len());
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<ObjectInfo>> {
        let dir = self.namespace_dir(namespace)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::storage(format!(
                    "Failed to list {}: {}",
                    namespace, e
                )))
            }
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage(format!("Failed to list {}: {}", namespace, e)))?
        {
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };

            objects.push(ObjectInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                size: meta.len(),
                created: meta.created().ok().map(DateTime::<Utc>::from),
                updated: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let path = self.object_path(namespace, name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_storage(e, namespace, name))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_read_list_delete() {
        let (_dir, store) = store();

        store
            .write("acme-requirements", "gdpr.pdf", b"%PDF-1.4", "application/pdf")
            .await
            .unwrap();

        assert!(store.exists("acme-requirements", "gdpr.pdf").await.unwrap());
        assert_eq!(
            store.read("acme-requirements", "gdpr.pdf").await.unwrap(),
            b"%PDF-1.4"
        );

        let listed = store.list("acme-requirements").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "gdpr.pdf");
        assert_eq!(listed[0].size, 8);

        store.delete("acme-requirements", "gdpr.pdf").await.unwrap();
        assert!(!store.exists("acme-requirements", "gdpr.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_namespace_and_object() {
        let (_dir, store) = store();

        assert!(store.list("nobody-requirements").await.unwrap().is_empty());
        assert!(!store.exists("nobody-requirements", "x.pdf").await.unwrap());

        let err = store.read("nobody-requirements", "x.pdf").await.unwrap_err();
        assert!(err.is_document_not_found());

        let err = store.delete("nobody-requirements", "x.pdf").await.unwrap_err();
        assert!(err.is_document_not_found());
    }

    #[tokio::test]
    async fn test_rejects_path_escape() {
        let (_dir, store) = store();

        for name in ["../etc", "a/b.pdf", "..", "a\\b.pdf", ""] {
            let result = store.write("ns", name, b"x", "text/plain").await;
            assert!(matches!(result, Err(Error::Validation(_))), "{:?}", name);
        }
        assert!(store.list("..").await.is_err());
        assert!(store.delete("ns", "a/b.pdf").await.is_err());
    }

    #[tokio::test]
    async fn test_unstorable_names_are_absent() {
        let (_dir, store) = store();

        for name in ["eu/gdpr.pdf", "eu\\gdpr.pdf", "..", ""] {
            assert!(!store.exists("acme-requirements", name).await.unwrap(), "{:?}", name);
            let err = store.read("acme-requirements", name).await.unwrap_err();
            assert!(err.is_document_not_found(), "{:?}", name);
        }
    }
}
