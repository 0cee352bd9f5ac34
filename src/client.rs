use aws_sdk_s3::config::Region;

use crate::config::Config;
use crate::error::{Result, VaultError};
use crate::logger::Timer;
use crate::models::image::GenerationRequest;
use crate::models::metadata::ImageMetadata;
use crate::models::storage::{KeyStyle, UploadResult};
use crate::replicate::ReplicateClient;
use crate::storage::{S3Uploader, DEFAULT_REGION};

#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub bucket: String,
    pub key_style: KeyStyle,
    pub public: bool,
}

pub struct VaultClient {
    replicate: ReplicateClient,
    storage: S3Uploader,
}

impl VaultClient {
    pub async fn new(config: Config) -> Result<Self> {
        let replicate = ReplicateClient::new(config.replicate)?;

        let region = config
            .s3
            .region
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let aws_config = aws_config::from_env()
            .region(Region::new(region.clone()))
            .load()
            .await;
        let storage = S3Uploader::new(aws_sdk_s3::Client::new(&aws_config), region);

        Ok(Self { replicate, storage })
    }

    pub fn from_parts(replicate: ReplicateClient, storage: S3Uploader) -> Self {
        Self { replicate, storage }
    }

    pub fn replicate(&self) -> &ReplicateClient {
        &self.replicate
    }

    pub fn storage(&self) -> &S3Uploader {
        &self.storage
    }

    /// The whole generate-then-archive pipeline: one prediction, parameters
    /// stamped into the PNG, the file uploaded under the derived key. The
    /// staging file is removed on every exit path, cancellation included.
    pub async fn generate_and_archive(
        &self,
        request: &GenerationRequest,
        options: &ArchiveOptions,
    ) -> Result<UploadResult> {
        // 1. Generate
        let generated = {
            let _timer = Timer::new("prediction");
            self.replicate.generate(request).await?
        };

        // 2. Stamp the generation parameters into the PNG
        let metadata = ImageMetadata::new(request);
        let png = metadata.encode_png(&generated.image)?;

        // 3. Stage locally; the handle deletes the file when dropped
        let staged = tempfile::Builder::new()
            .prefix("sd3vault-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| VaultError::Io(format!("Failed to create staging file: {}", e)))?;
        std::fs::write(staged.path(), &png).map_err(|e| {
            VaultError::Io(format!("Failed to write {}: {}", staged.path().display(), e))
        })?;
        log::debug!("💾 Staged {} bytes at {}", png.len(), staged.path().display());

        // 4. Upload
        let key = options.key_style.storage_key();
        let result = self
            .storage
            .upload(
                staged.path(),
                &options.bucket,
                &key,
                &metadata,
                options.public,
            )
            .await?;

        staged
            .close()
            .map_err(|e| VaultError::Io(format!("Failed to remove staging file: {}", e)))?;
        log::debug!("🧹 Staging file removed");

        Ok(result)
    }
}
