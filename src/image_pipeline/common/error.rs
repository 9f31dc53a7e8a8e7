use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to convert {file}: could not decode raw image: {reason}")]
    DecodeFailed { file: String, reason: String },

    #[error("Failed to convert {file}: could not encode EXR image: {reason}")]
    EncodeFailed { file: String, reason: String },

    #[error("Cannot prepare output path for {file}: {reason}")]
    OutputPathError { file: String, reason: String },

    #[error("No RW2 files found in {0}")]
    NoInputFiles(String),

    #[error("Invalid conversion target: {0}")]
    InvalidTarget(String),

    #[error("{failed} of {total} files failed to convert: {summary}")]
    BatchFailed {
        failed: usize,
        total: usize,
        summary: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
