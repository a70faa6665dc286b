//! Google Cloud Storage object store
//!
//! Each namespace is a bucket. Buckets are created on first write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::buckets::insert::{
    BucketCreationConfig, InsertBucketParam, InsertBucketRequest,
};
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};

use crate::config::GcpConfig;
use crate::error::{Error, Result};
use crate::providers::object_store::{ObjectInfo, ObjectStore};

/// Object store with one GCS bucket per namespace
pub struct GcsObjectStore {
    client: GcsClient,
    project_id: String,
    bucket_location: String,
}

fn is_not_found(e: &google_cloud_storage::http::Error) -> bool {
    matches!(e, google_cloud_storage::http::Error::Response(r) if r.code == 404)
}

fn is_conflict(e: &google_cloud_storage::http::Error) -> bool {
    matches!(e, google_cloud_storage::http::Error::Response(r) if r.code == 409)
}

impl GcsObjectStore {
    /// Create a GCS store authenticated with the configured service account
    pub async fn new(config: &GcpConfig) -> Result<Self> {
        let key_path = config.service_account_key_path.to_string_lossy().to_string();
        let credentials = CredentialsFile::new_from_file(key_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to load GCS credentials: {}", e)))?;

        let client_config = ClientConfig::default()
            .with_credentials(credentials)
            .await
            .map_err(|e| Error::Config(format!("Failed to create GCS client: {}", e)))?;

        Ok(Self {
            client: GcsClient::new(client_config),
            project_id: config.project_id.clone(),
            bucket_location: config.bucket_location.clone(),
        })
    }

    async fn ensure_bucket(&self, namespace: &str) -> Result<()> {
        let request = InsertBucketRequest {
            name: namespace.to_string(),
            param: InsertBucketParam {
                project: self.project_id.clone(),
                ..Default::default()
            },
            bucket: BucketCreationConfig {
                location: self.bucket_location.clone(),
                ..Default::default()
            },
        };

        match self.client.insert_bucket(&request).await {
            Ok(_) => {
                tracing::info!("Created bucket {} in {}", namespace, self.bucket_location);
                Ok(())
            }
            Err(e) if is_conflict(&e) => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "Failed to create bucket {}: {}",
                namespace, e
            ))),
        }
    }

    async fn upload(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        content_type: &str,
    ) -> std::result::Result<(), google_cloud_storage::http::Error> {
        let mut media = Media::new(name.to_string());
        media.content_type = content_type.to_string().into();

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: namespace.to_string(),
                    ..Default::default()
                },
                data.to_vec(),
                &UploadType::Simple(media),
            )
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let request = GetObjectRequest {
            bucket: namespace.to_string(),
            object: name.to_string(),
            ..Default::default()
        };

        match self.client.get_object(&request).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(Error::storage(format!(
                "Failed to stat gs://{}/{}: {}",
                namespace, name, e
            ))),
        }
    }

    async fn read(&self, namespace: &str, name: &str) -> Result<Vec<u8>> {
        let request = GetObjectRequest {
            bucket: namespace.to_string(),
            object: name.to_string(),
            ..Default::default()
        };

        self.client
            .download_object(&request, &Range::default())
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    Error::DocumentNotFound(format!("{}/{}", namespace, name))
                } else {
                    Error::storage(format!(
                        "Failed to download gs://{}/{}: {}",
                        namespace, name, e
                    ))
                }
            })
    }

    async fn write(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        match self.upload(namespace, name, data, content_type).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => {
                self.ensure_bucket(namespace).await?;
                self.upload(namespace, name, data, content_type)
                    .await
                    .map_err(|e| {
                        Error::storage(format!(
                            "Failed to upload gs://{}/{}: {}",
                            namespace, name, e
                        ))
                    })
            }
            Err(e) => Err(Error::storage(format!(
                "Failed to upload gs://{}/{}: {}",
                namespace, name, e
            ))),
        }
    }

    async fn list(&self, namespace: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut page_token = None;

        loop {
            let request = ListObjectsRequest {
                bucket: namespace.to_string(),
                page_token: page_token.take(),
                ..Default::default()
            };

            let response = match self.client.list_objects(&request).await {
                Ok(response) => response,
                Err(e) if is_not_found(&e) => return Ok(Vec::new()),
                Err(e) => {
                    return Err(Error::storage(format!(
                        "Failed to list gs://{}: {}",
                        namespace, e
                    )))
                }
            };

            for item in response.items.unwrap_or_default() {
                objects.push(ObjectInfo {
                    name: item.name,
                    size: item.size.max(0) as u64,
                    created: item.time_created.and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.unix_timestamp(), t.nanosecond())
                    }),
                    updated: item.updated.and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.unix_timestamp(), t.nanosecond())
                    }),
                });
            }

            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let request = DeleteObjectRequest {
            bucket: namespace.to_string(),
            object: name.to_string(),
            ..Default::default()
        };

        self.client.delete_object(&request).await.map_err(|e| {
            if is_not_found(&e) {
                Error::DocumentNotFound(format!("{}/{}", namespace, name))
            } else {
                Error::storage(format!(
                    "Failed to delete gs://{}/{}: {}",
                    namespace, name, e
                ))
            }
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let request = google_cloud_storage::http::buckets::list::ListBucketsRequest {
            project: self.project_id.clone(),
            max_results: Some(1),
            ..Default::default()
        };

        self.client
            .list_buckets(&request)
            .await
            .map(|_| true)
            .map_err(|e| Error::storage(format!("GCS health check failed: {}", e)))
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
