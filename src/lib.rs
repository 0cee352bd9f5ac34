pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod replicate;
pub mod storage;

pub use client::{ArchiveOptions, VaultClient};
pub use config::{Config, ReplicateConfig, S3Config};
pub use error::{Result, VaultError};
pub use models::{
    GeneratedImage, GenerationRequest, ImageMetadata, KeyStyle, OutputFormat, UploadResult,
};
pub use replicate::{PredictionOutput, ReplicateClient, MODEL_ID};
pub use storage::{S3Uploader, DEFAULT_REGION};
