//! Object store trait for organization document namespaces

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Listing entry for a stored object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    /// Object name within its namespace
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation time, when the backend records one
    pub created: Option<DateTime<Utc>>,
    /// Last modification time, when the backend records one
    pub updated: Option<DateTime<Utc>>,
}

/// Trait for namespaced binary object storage
///
/// A namespace maps to a bucket (GCS) or a directory (local). Reading or
/// deleting an absent object returns `Error::DocumentNotFound`; any other
/// failure is `Error::Storage`.
///
/// Implementations:
/// - `LocalObjectStore`: Local filesystem
/// - `MemoryObjectStore`: In-process map
/// - `GcsObjectStore`: Google Cloud Storage (gcp feature)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool>;

    /// Read the full object contents
    async fn read(&self, namespace: &str, name: &str) -> Result<Vec<u8>>;

    /// Write an object, creating the namespace if needed
    async fn write(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()>;

    /// List objects in a namespace (empty when the namespace does not exist)
    async fn list(&self, namespace: &str) -> Result<Vec<ObjectInfo>>;

    /// Delete an object
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
