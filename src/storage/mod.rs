//! Object storage for source and destination images
//! Uses Apache Arrow object_store crate

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, path::Path as StoragePath,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::job::Location;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Download failed for {location}: {source}")]
    DownloadFailed {
        location: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Upload failed for {location}: {source}")]
    UploadFailed {
        location: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Blob access by bucket and key.
///
/// Implementations must be safe to share across all workers.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Fetch the object at `location`
    async fn get(&self, location: &Location) -> Result<Bytes>;

    /// Store `data` at `location` with the given content type
    async fn put(&self, location: &Location, data: Bytes, content_type: &str) -> Result<()>;
}

/// Connection settings for an S3-compatible backend
#[derive(Debug, Clone)]
pub struct S3Options {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
enum Backend {
    S3(S3Options),
    Memory,
}

/// Storage client wrapping object_store, one backend per bucket
#[derive(Clone)]
pub struct StorageClient {
    backend: Backend,
    buckets: Arc<RwLock<HashMap<String, Arc<dyn ObjectStore>>>>,
}

impl StorageClient {
    /// Create an S3 storage client; buckets are opened on first use
    pub fn s3(options: S3Options) -> Self {
        Self {
            backend: Backend::S3(options),
            buckets: Arc::default(),
        }
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            buckets: Arc::default(),
        }
    }

    /// Register a prebuilt store for `bucket`, replacing any existing one
    pub async fn with_bucket(self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.buckets.write().await.insert(bucket.into(), store);
        self
    }

    async fn bucket(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self.buckets.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut buckets = self.buckets.write().await;
        // Another worker may have opened it while we waited for the lock
        if let Some(store) = buckets.get(bucket) {
            return Ok(store.clone());
        }

        let store: Arc<dyn ObjectStore> = match &self.backend {
            Backend::S3(options) => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(bucket)
                    .with_region(&options.region)
                    .with_access_key_id(&options.access_key)
                    .with_secret_access_key(&options.secret_key);
                if let Some(endpoint) = &options.endpoint {
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }
                Arc::new(builder.build()?)
            }
            Backend::Memory => Arc::new(InMemory::new()),
        };

        tracing::debug!(bucket, "Opened storage bucket");
        buckets.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl ObjectStorage for StorageClient {
    async fn get(&self, location: &Location) -> Result<Bytes> {
        let store = self.bucket(&location.bucket).await?;
        let path = StoragePath::from(location.key.as_str());

        let result = store.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StorageError::NotFound(location.to_string()),
            source => StorageError::DownloadFailed {
                location: location.to_string(),
                source,
            },
        })?;

        let bytes = result.bytes().await.map_err(|source| StorageError::DownloadFailed {
            location: location.to_string(),
            source,
        })?;

        tracing::debug!(%location, size = bytes.len(), "Downloaded from storage");

        Ok(bytes)
    }

    async fn put(&self, location: &Location, data: Bytes, content_type: &str) -> Result<()> {
        let store = self.bucket(&location.bucket).await?;
        let path = StoragePath::from(location.key.as_str());
        let size = data.len();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        store
            .put_opts(&path, PutPayload::from(data), options)
            .await
            .map_err(|source| StorageError::UploadFailed {
                location: location.to_string(),
                source,
            })?;

        tracing::debug!(%location, size, content_type, "Uploaded to storage");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_put_then_get() {
        let storage = StorageClient::in_memory();
        let location = Location::new("b1", "dir/a.jpg");

        storage
            .put(&location, Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();

        let bytes = storage.get(&location).await.unwrap();
        assert_eq!(&bytes[..], b"jpeg");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let storage = StorageClient::in_memory();
        let err = storage.get(&Location::new("b1", "missing.png")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref loc) if loc == "b1/missing.png"));
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let storage = StorageClient::in_memory();
        storage
            .put(&Location::new("b1", "k"), Bytes::from_static(b"one"), "image/jpeg")
            .await
            .unwrap();

        assert!(storage.get(&Location::new("b2", "k")).await.is_err());
    }

    #[tokio::test]
    async fn test_with_bucket_uses_provided_store() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        store
            .put(&StoragePath::from("seed.png"), PutPayload::from(Bytes::from_static(b"seed")))
            .await
            .unwrap();

        let storage = StorageClient::in_memory().with_bucket("src", store).await;
        let bytes = storage.get(&Location::new("src", "seed.png")).await.unwrap();
        assert_eq!(&bytes[..], b"seed");
    }
}
