use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read region {region} at address {address:#x}: {message}")]
    RegionRead {
        region: String,
        address: u64,
        message: String,
    },

    #[error("No program available: {0}")]
    NoProgram(String),

    #[error("Output target unavailable: {0}")]
    OutputTarget(String),

    #[error("Failed to write artifact to {}: {source}", .path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to allocate container buffer: {0}")]
    BufferAllocation(String),

    #[error("Export cancelled during {stage} after {processed} entries")]
    Cancelled { stage: &'static str, processed: usize },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Binary parse error: {0}")]
    BinaryParse(String),

    #[error("Malformed container at offset {offset:#x}: {message}")]
    MalformedContainer { offset: u64, message: String },

    #[error("Invalid permissions: {0}")]
    InvalidPermissions(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the error came from a cooperative cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Error::MalformedContainer {
            offset: offset as u64,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
