//! S3 storage service for request documents.
//!
//! Handles uploads, presigned URLs and compensating deletes.
//! Supports both AWS S3 and MinIO for development.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use tracing::info;

use crate::config::StorageSettings;
use crate::error::{AppError, AppResult};

/// Blob store capability consumed by the lifecycle engine.
///
/// The upload-then-record sequences need exactly three operations: write a
/// blob, sign a download URL, and delete a blob again when the matching row
/// insert fails.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a blob.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> AppResult<()>;

    /// Produce a presigned download URL. `NotFound` when the key is absent.
    async fn sign(&self, key: &str, ttl_secs: u64) -> AppResult<String>;

    /// Delete a blob. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    /// Create a new S3 storage client from configuration.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "feridesk");

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        // Use custom endpoint for MinIO in development
        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        let storage = Self {
            client,
            bucket: config.bucket.clone(),
        };

        // Verify bucket exists or create it
        storage.ensure_bucket_exists().await?;

        info!("S3 storage initialized: bucket={}", config.bucket);

        Ok(storage)
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("S3 bucket '{}' exists", self.bucket);
                Ok(())
            }
            Err(e) => {
                // Check if it's a "not found" error
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    info!("S3 bucket '{}' created", self.bucket);
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }

    /// Get the content type for a file based on its extension.
    pub fn content_type_for_extension(ext: &str) -> &'static str {
        match ext.to_lowercase().as_str() {
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "tif" | "tiff" => "image/tiff",
            "json" => "application/json",
            "txt" => "text/plain",
            "csv" => "text/csv",
            "xml" => "application/xml",
            "zip" => "application/zip",
            _ => "application/octet-stream",
        }
    }

    /// Build the blob key for a draft/proforma file.
    ///
    /// Format: requests/{request_id}/drafts/{file_name}
    pub fn draft_key(request_id: &str, file_name: &str) -> String {
        format!("requests/{}/drafts/{}", request_id, file_name)
    }

    /// Build the blob key for a delivered final document.
    ///
    /// Format: requests/{request_id}/deliveries/{file_name}
    pub fn delivery_key(request_id: &str, file_name: &str) -> String {
        format!("requests/{}/deliveries/{}", request_id, file_name)
    }

    /// Build the blob key for a supporting document.
    ///
    /// Format: requests/{request_id}/documents/{file_name}
    pub fn document_key(request_id: &str, file_name: &str) -> String {
        format!("requests/{}/documents/{}", request_id, file_name)
    }

    /// Build the blob key for a payment proof.
    ///
    /// Format: requests/{request_id}/proofs/{file_name}
    pub fn proof_key(request_id: &str, file_name: &str) -> String {
        format!("requests/{}/proofs/{}", request_id, file_name)
    }
}

#[async_trait]
impl BlobStore for Storage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> AppResult<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file to S3: {}", e)))?;

        Ok(())
    }

    async fn sign(&self, key: &str, ttl_secs: u64) -> AppResult<String> {
        // Presigning never touches the object, so probe for existence first
        // to honor the NotFound contract.
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    AppError::NotFound(format!("File {}", key))
                } else {
                    AppError::Storage(format!("Failed to stat file in S3: {}", service_error))
                }
            })?;

        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| AppError::Storage(format!("Invalid presign TTL: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to presign URL: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file from S3: {}", e)))?;

        Ok(())
    }
}
