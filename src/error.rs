use thiserror::Error;

/// Library error type for photo library and configuration operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured photo library path is missing or not a directory.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// The scan completed but found no images.
    #[error("no images found in {0}")]
    EmptyScan(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
