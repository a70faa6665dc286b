//! In-memory object store for tests and ephemeral deployments

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::object_store::{ObjectInfo, ObjectStore};
use crate::error::{Error, Result};

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

/// Object store held in a concurrent map keyed by (namespace, name)
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, name: &str) -> (String, String) {
        (namespace.to_string(), name.to_string())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self.objects.contains_key(&Self::key(namespace, name)))
    }

    async fn read(&self, namespace: &str, name: &str) -> Result<Vec<u8>> {
        self.objects
            .get(&Self::key(namespace, name))
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::DocumentNotFound(format!("{}/{}", namespace, name)))
    }

    async fn write(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        let now = Utc::now();
        self.objects
            .entry(Self::key(namespace, name))
            .and_modify(|o| {
                o.data = data.to_vec();
                o.updated = now;
            })
            .or_insert_with(|| StoredObject {
                data: data.to_vec(),
                created: now,
                updated: now,
            });
        Ok(())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects: Vec<ObjectInfo> = self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == namespace)
            .map(|entry| ObjectInfo {
                name: entry.key().1.clone(),
                size: entry.value().data.len() as u64,
                created: Some(entry.value().created),
                updated: Some(entry.value().updated),
            })
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.objects
            .remove(&Self::key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| Error::DocumentNotFound(format!("{}/{}", namespace, name)))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
