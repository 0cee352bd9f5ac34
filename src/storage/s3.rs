use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;

use crate::error::{Result, VaultError};
use crate::models::metadata::ImageMetadata;
use crate::models::storage::{filename_of, UploadResult};

pub const DEFAULT_REGION: &str = "eu-central-1";

// One year; archived artifacts are immutable.
const CACHE_CONTROL: &str = "public, max-age=31536000";

pub struct S3Uploader {
    client: Client,
    region: String,
}

impl S3Uploader {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Upload the staged PNG under `key`, mirroring the generation parameters
    /// into the object metadata. Nothing is retried; callers decide what a
    /// failed upload means.
    pub async fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        metadata: &ImageMetadata,
        public: bool,
    ) -> Result<UploadResult> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            VaultError::Io(format!("Failed to read {}: {}", local_path.display(), e))
        })?;

        let mirror = metadata.s3_metadata();

        log::info!("📤 Uploading to s3://{}/{}", bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type("image/png")
            .cache_control(CACHE_CONTROL)
            .set_metadata(Some(mirror.clone()))
            .send()
            .await
            .map_err(|e| {
                log::error!("AWS SDK upload error details: {:?}", e);

                if let Some(service_error) = e.as_service_error() {
                    match service_error.code() {
                        Some("NoSuchBucket") => VaultError::BucketNotFound(format!(
                            "Bucket '{}' does not exist or is in another region",
                            bucket
                        )),
                        Some("AccessDenied") => VaultError::AccessDenied(format!(
                            "Access denied writing to bucket '{}'. Check your AWS credentials and the bucket policy",
                            bucket
                        )),
                        _ => VaultError::UploadFailed(format!(
                            "S3 service error: {} - {}",
                            service_error.code().unwrap_or("unknown"),
                            service_error.message().unwrap_or("no message")
                        )),
                    }
                } else {
                    VaultError::UploadFailed(format!("S3 upload failed: {}", e))
                }
            })?;

        let s3_uri = format!("s3://{}/{}", bucket, key);
        let public_url = format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            bucket, self.region, key
        );

        log::info!("✅ Upload complete: {}", s3_uri);

        Ok(UploadResult {
            s3_uri,
            public_url,
            key: key.to_string(),
            filename: filename_of(key).to_string(),
            bucket: bucket.to_string(),
            region: self.region.clone(),
            is_public: public,
            generated_at: metadata.generated_at,
            prompt: metadata.prompt.clone(),
            metadata: mirror,
        })
    }
}
