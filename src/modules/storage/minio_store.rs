//! MinIO/S3-compatible attachment backend
//!
//! Uses rust-s3 crate for lightweight S3 operations. Objects are private;
//! read access goes through presigned URLs.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::attachment_store::{
    extension_for_content_type, AttachmentRef, AttachmentStore,
};

pub struct MinIOAttachmentStore {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    prefix: String,
    presigned_url_expiry_secs: u32,
}

impl MinIOAttachmentStore {
    /// Create a new MinIO store from configuration, creating the bucket if needed
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let store = Self {
            bucket,
            region,
            credentials,
            prefix: config.prefix.trim_matches('/').to_string(),
            presigned_url_expiry_secs: config.presigned_url_expiry_secs,
        };

        store.ensure_bucket_exists().await;

        info!(
            "MinIO attachment store initialized for endpoint: {}, bucket: {}, prefix: {}",
            config.endpoint,
            store.bucket.name(),
            store.prefix
        );

        Ok(store)
    }

    /// Ensure the bucket exists, create if not
    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    fn key_for(&self, reference: &AttachmentRef) -> String {
        if self.prefix.is_empty() {
            reference.to_string()
        } else {
            format!("{}/{}", self.prefix, reference)
        }
    }

    fn is_missing(error: &s3::error::S3Error) -> bool {
        let error_str = error.to_string();
        error_str.contains("404") || error_str.contains("NoSuchKey")
    }
}

fn is_success(status_code: u16) -> bool {
    (200..300).contains(&status_code)
}

#[async_trait]
impl AttachmentStore for MinIOAttachmentStore {
    async fn store(&self, payload: Vec<u8>, content_type: &str) -> Result<AttachmentRef> {
        if payload.is_empty() {
            return Err(AppError::Validation(
                "Attachment payload must not be empty".to_string(),
            ));
        }

        let reference = AttachmentRef::generate(extension_for_content_type(content_type));
        let key = self.key_for(&reference);

        // A single PUT either lands the whole object or nothing
        let response = self
            .bucket
            .put_object_with_content_type(&key, &payload, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;

        if !is_success(response.status_code()) {
            return Err(AppError::Storage(format!(
                "Failed to upload '{}': status {}",
                key,
                response.status_code()
            )));
        }

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(reference)
    }

    async fn resolve(&self, reference: &AttachmentRef) -> Result<String> {
        let key = self.key_for(reference);

        match self.bucket.head_object(&key).await {
            Ok((_, 404)) => {
                return Err(AppError::NotFound(format!(
                    "Attachment '{}' not found",
                    reference
                )))
            }
            Ok(_) => {}
            Err(e) if Self::is_missing(&e) => {
                return Err(AppError::NotFound(format!(
                    "Attachment '{}' not found",
                    reference
                )))
            }
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to check '{}': {}",
                    key, e
                )))
            }
        }

        self.bucket
            .presign_get(&key, self.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    key, e
                ))
            })
    }

    async fn load(&self, reference: &AttachmentRef) -> Result<Vec<u8>> {
        let key = self.key_for(reference);

        let response = self.bucket.get_object(&key).await.map_err(|e| {
            if Self::is_missing(&e) {
                AppError::NotFound(format!("Attachment '{}' not found", reference))
            } else {
                AppError::Storage(format!("Failed to download '{}': {}", key, e))
            }
        })?;

        match response.status_code() {
            404 => Err(AppError::NotFound(format!(
                "Attachment '{}' not found",
                reference
            ))),
            code if !is_success(code) => Err(AppError::Storage(format!(
                "Failed to download '{}': status {}",
                key, code
            ))),
            _ => Ok(response.to_vec()),
        }
    }

    async fn release(&self, reference: &AttachmentRef) -> Result<()> {
        let key = self.key_for(reference);

        match self.bucket.delete_object(&key).await {
            Ok(response) if !is_success(response.status_code()) && response.status_code() != 404 => {
                Err(AppError::Storage(format!(
                    "Failed to delete '{}': status {}",
                    key,
                    response.status_code()
                )))
            }
            Ok(_) => {
                debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
                Ok(())
            }
            Err(e) if Self::is_missing(&e) => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete '{}': {}",
                key, e
            ))),
        }
    }
}
