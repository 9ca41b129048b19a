use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
