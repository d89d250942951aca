//! TRE error types

use thiserror::Error;

/// TRE format error type
#[derive(Debug, Error)]
pub enum TreError {
    /// Magic token is not `TREE`
    #[error("unsupported container format: token 0x{0:08X}")]
    UnsupportedFormat(u32),

    /// Version is neither `0005` nor `0006`
    #[error("unsupported container version: 0x{0:08X}")]
    UnsupportedVersion(u32),

    /// Truncated input, size mismatch, or malformed record/name data
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Compression method code that has no decoder
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u32),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl TreError {
    /// Shorthand for [`TreError::CorruptArchive`]
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptArchive(msg.into())
    }
}

/// Result type for TRE operations
pub type TreResult<T> = Result<T, TreError>;
