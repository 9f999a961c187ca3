//! Object storage implementation using S3/MinIO
//!
//! Holds uploaded source clips and annotated result videos, and signs
//! short-lived URLs so clients never touch the bucket credentials.

use crate::{StorageError, StorageResult};
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// S3/MinIO configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,

    /// AWS region (e.g., "us-west-2") or "us-east-1" for `MinIO`
    pub region: String,

    /// S3 endpoint (custom for `MinIO`, empty for AWS S3)
    pub endpoint: Option<String>,

    /// AWS access key ID
    pub access_key_id: String,

    /// AWS secret access key
    pub secret_access_key: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: std::env::var("ATHLETE_BUCKET")
                .unwrap_or_else(|_| "athlete-videos".to_string()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-west-2".to_string()),
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
        }
    }
}

/// Object storage trait
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store a file from bytes with a content type
    async fn store_file(&self, key: &str, data: &[u8], content_type: &str)
        -> StorageResult<String>;

    /// Store a file from local path
    async fn store_file_from_path(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Retrieve a file as bytes
    async fn retrieve_file(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Retrieve a file and save to local path
    async fn retrieve_file_to_path(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Sign a GET URL for downloading an object
    async fn presigned_get_url(&self, key: &str, expires: Duration) -> StorageResult<String>;

    /// Sign a PUT URL for uploading an object with the given content type
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires: Duration,
    ) -> StorageResult<String>;
}

/// S3/MinIO object storage implementation
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
}

impl S3ObjectStorage {
    /// Create a new S3 object storage client
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "athlete-storage",
        );

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(region)
            .behavior_version_latest();

        // Set custom endpoint for MinIO
        if let Some(endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    fn presign_config(expires: Duration) -> StorageResult<PresigningConfig> {
        PresigningConfig::expires_in(expires)
            .map_err(|e| StorageError::SigningError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn store_file(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<String> {
        let byte_stream = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(byte_stream)
            .send()
            .await
            .map_err(|e| StorageError::S3Error(e.to_string()))?;

        debug!("Stored {} ({} bytes)", key, data.len());
        Ok(key.to_string())
    }

    async fn store_file_from_path(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String> {
        let data = tokio::fs::read(path).await?;
        self.store_file(key, &data, content_type).await
    }

    async fn retrieve_file(&self, key: &str) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3Error(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3Error(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn retrieve_file_to_path(&self, key: &str, path: &Path) -> StorageResult<()> {
        let data = self.retrieve_file(key).await?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires: Duration) -> StorageResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presign_config(expires)?)
            .await
            .map_err(|e| StorageError::SigningError(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        expires: Duration,
    ) -> StorageResult<String> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presign_config(expires)?)
            .await
            .map_err(|e| StorageError::SigningError(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_config_default_bucket() {
        // Default bucket comes from env or the built-in name
        let config = S3Config {
            bucket: "athlete-videos".to_string(),
            ..Default::default()
        };
        assert_eq!(config.bucket, "athlete-videos");
    }

    #[test]
    fn test_s3_config_with_minio() {
        let config = S3Config {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
        };

        assert_eq!(config.endpoint, Some("http://localhost:9000".to_string()));
    }

    #[test]
    fn test_presign_config_rejects_zero_expiry() {
        assert!(S3ObjectStorage::presign_config(Duration::from_secs(0)).is_err());
    }
}
