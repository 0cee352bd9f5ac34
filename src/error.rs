use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Upload failed: {0}")]
    UploadFailed(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;
